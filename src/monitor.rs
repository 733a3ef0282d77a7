//! One monitoring cycle: poll every account, dedup against the ledger,
//! filter by keyword, extract mint addresses, dispatch actions, persist.
//!
//! The cycle runner owns the ledger while a cycle is in flight and is the
//! only code that mutates it. A post id is added to the ledger *before*
//! its actions run: idempotency keys off the mark, not off action success,
//! so a failed swap or email is never retried on a later cycle.

use crate::actuate::Actuator;
use crate::error::MonitorError;
use crate::extract;
use crate::feed::FeedSource;
use crate::keyword;
use crate::ledger::{Ledger, LedgerStore};
use crate::models::{ActionOutcome, CycleStats, PostItem};
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What the cycle runner needs to know, extracted from the full config.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Account handles to poll, in order.
    pub accounts: Vec<String>,
    /// Literal keywords a post must contain to be dispatched.
    pub keywords: Vec<String>,
    /// How many recent posts to fetch per account.
    pub fetch_count: usize,
    /// Who receives alert emails.
    pub notify_recipient: String,
    /// USD value of each swap attempt.
    pub actuate_amount_usd: f64,
}

/// Drives the poll → dedup → filter → extract → dispatch pipeline.
pub struct Monitor {
    feed: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    actuator: Arc<dyn Actuator>,
    store: LedgerStore,
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
        actuator: Arc<dyn Actuator>,
        store: LedgerStore,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            feed,
            notifier,
            actuator,
            store,
            settings,
        }
    }

    /// Run one full pass over all monitored accounts.
    ///
    /// Nothing that happens inside a cycle escapes as an error: account
    /// and action failures are logged and isolated, and the ledger
    /// snapshot is rewritten at the end no matter what.
    pub async fn run_cycle(&self, ledger: &mut Ledger) -> CycleStats {
        let mut stats = CycleStats::new();
        info!(
            "Starting cycle over {} accounts",
            self.settings.accounts.len()
        );

        for handle in &self.settings.accounts {
            match self.poll_account(handle, ledger, &mut stats).await {
                Ok(()) => stats.accounts_polled += 1,
                Err(e) => {
                    warn!("{}", e);
                    stats.accounts_skipped += 1;
                }
            }
        }

        if let Err(source) = self.store.save(ledger) {
            error!("{}", MonitorError::Persistence { source });
        }

        info!(
            "Cycle complete in {:.1}s: {} accounts polled, {} skipped, {} posts seen, {} matched, {} ids in ledger",
            stats.elapsed_seconds(),
            stats.accounts_polled,
            stats.accounts_skipped,
            stats.posts_seen,
            stats.posts_matched,
            ledger.len()
        );
        stats
    }

    /// Poll a single account and dispatch its new matching posts.
    async fn poll_account(
        &self,
        handle: &str,
        ledger: &mut Ledger,
        stats: &mut CycleStats,
    ) -> Result<(), MonitorError> {
        debug!("Polling @{}", handle);

        let account_id = match self.feed.resolve(handle).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                return Err(MonitorError::Resolution {
                    handle: handle.to_string(),
                    reason: "handle not found".to_string(),
                })
            }
            Err(e) => {
                return Err(MonitorError::Resolution {
                    handle: handle.to_string(),
                    reason: format!("{:#}", e),
                })
            }
        };

        let posts = self
            .feed
            .fetch_recent(&account_id, self.settings.fetch_count)
            .await
            .map_err(|source| MonitorError::Fetch {
                handle: handle.to_string(),
                source,
            })?;
        if posts.is_empty() {
            debug!("No posts for @{}", handle);
            return Ok(());
        }
        stats.posts_seen += posts.len();

        let fresh: Vec<PostItem> = posts
            .into_iter()
            .filter(|post| !ledger.contains(&post.id))
            .collect();
        if fresh.is_empty() {
            debug!("No new posts for @{}", handle);
            return Ok(());
        }

        for post in fresh {
            if !keyword::matches_any(&post.text, &self.settings.keywords) {
                debug!("Post {} has no keyword match", post.id);
                continue;
            }

            // Mark before dispatching: a failed action must not come back
            // on the next cycle.
            ledger.insert(post.id.clone());
            let outcome = self.dispatch(handle, &post).await;
            stats.posts_matched += 1;
            stats.outcomes.push(outcome);
        }
        Ok(())
    }

    /// Run the swap attempts and the single notification for one matched
    /// post.
    async fn dispatch(&self, handle: &str, post: &PostItem) -> ActionOutcome {
        info!("Keyword match in post {} from @{}", post.id, handle);

        let mut outcome = ActionOutcome {
            post_id: post.id.clone(),
            ..Default::default()
        };
        let mut body = format!(
            "Keyword match found in post:\n\n{}\n\nLink: https://twitter.com/{}/status/{}",
            post.text, handle, post.id
        );

        let addresses = extract::extract_addresses(&post.text);
        if addresses.is_empty() {
            body.push_str("\n\nNo token address found.");
        } else {
            for address in &addresses {
                body.push_str(&format!(
                    "\n\nFound token address: {}\nAttempting to buy...",
                    address
                ));
                outcome.swaps_attempted += 1;
                if let Err(source) = self
                    .actuator
                    .execute(address, self.settings.actuate_amount_usd)
                    .await
                {
                    outcome.swaps_failed += 1;
                    warn!(
                        "{}",
                        MonitorError::Action {
                            action: "swap",
                            post_id: post.id.clone(),
                            source,
                        }
                    );
                }
            }
            outcome.addresses = addresses;
        }

        let subject = format!("Mintwatch alert: keyword match for @{}", handle);
        match self
            .notifier
            .send(&self.settings.notify_recipient, &subject, &body)
            .await
        {
            Ok(()) => outcome.notified = true,
            Err(source) => warn!(
                "{}",
                MonitorError::Action {
                    action: "notification",
                    post_id: post.id.clone(),
                    source,
                }
            ),
        }
        outcome
    }
}
