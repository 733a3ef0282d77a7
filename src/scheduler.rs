//! Fixed-interval cycle scheduling.
//!
//! One cycle runs at a time. The first cycle starts immediately; after
//! that a timer fires every poll interval. A tick that lands while a
//! cycle is still running is dropped — no queuing, no overlap — so the
//! ledger keeps a single writer. An in-progress cycle is never cancelled;
//! shutdown is honored between cycles.

use crate::ledger::Ledger;
use crate::monitor::Monitor;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

pub struct Scheduler {
    monitor: Monitor,
    interval: Duration,
}

impl Scheduler {
    pub fn new(monitor: Monitor, interval: Duration) -> Self {
        Self { monitor, interval }
    }

    /// Run cycles until ctrl-c.
    pub async fn run(&self, ledger: Ledger) -> Ledger {
        self.run_until(ledger, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Run cycles until `shutdown` resolves. Returns the final ledger so
    /// callers can inspect or report on it.
    pub async fn run_until(&self, mut ledger: Ledger, shutdown: impl Future<Output = ()>) -> Ledger {
        let mut timer = time::interval(self.interval);
        // A tick that fires mid-cycle is dropped, not queued.
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            "Scheduler running, polling every {}s",
            self.interval.as_secs()
        );
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.monitor.run_cycle(&mut ledger).await;
                    debug!("Cycle finished, waiting for next tick");
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested, scheduler stopping");
                    break;
                }
            }
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuate::Actuator;
    use crate::feed::FeedSource;
    use crate::ledger::LedgerStore;
    use crate::models::PostItem;
    use crate::monitor::MonitorSettings;
    use crate::notify::Notifier;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Counts cycles through resolve calls; optionally slow, to simulate
    /// a cycle outlasting the poll interval.
    struct CountingFeed {
        resolves: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl FeedSource for CountingFeed {
        async fn resolve(&self, _handle: &str) -> Result<Option<String>> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(None)
        }

        async fn fetch_recent(&self, _account_id: &str, _count: usize) -> Result<Vec<PostItem>> {
            Ok(vec![])
        }
    }

    struct NoopNotifier;

    #[async_trait]
    impl Notifier for NoopNotifier {
        async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NoopActuator;

    #[async_trait]
    impl Actuator for NoopActuator {
        async fn execute(&self, _identifier: &str, _usd_amount: f64) -> Result<()> {
            Ok(())
        }
    }

    fn scheduler(delay: Duration, resolves: Arc<AtomicUsize>, dir: &TempDir) -> Scheduler {
        let settings = MonitorSettings {
            accounts: vec!["acct1".to_string()],
            keywords: vec!["token".to_string()],
            fetch_count: 2,
            notify_recipient: "alerts@example.com".to_string(),
            actuate_amount_usd: 20.0,
        };
        let monitor = Monitor::new(
            Arc::new(CountingFeed { resolves, delay }),
            Arc::new(NoopNotifier),
            Arc::new(NoopActuator),
            LedgerStore::new(dir.path().join("ledger.json")),
            settings,
        );
        Scheduler::new(monitor, Duration::from_secs(300))
    }

    /// The first cycle runs at startup, before the first interval elapses.
    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately() {
        let dir = TempDir::new().unwrap();
        let resolves = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(Duration::ZERO, resolves.clone(), &dir);

        scheduler
            .run_until(Ledger::new(), tokio::time::sleep(Duration::from_secs(10)))
            .await;

        assert_eq!(resolves.load(Ordering::SeqCst), 1);
    }

    /// Cycles land on the interval grid: start, +300s, +600s.
    #[tokio::test(start_paused = true)]
    async fn test_cycles_follow_the_interval() {
        let dir = TempDir::new().unwrap();
        let resolves = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(Duration::ZERO, resolves.clone(), &dir);

        scheduler
            .run_until(Ledger::new(), tokio::time::sleep(Duration::from_secs(650)))
            .await;

        assert_eq!(resolves.load(Ordering::SeqCst), 3);
    }

    /// A cycle that outlasts the interval swallows the tick that fired
    /// while it ran: cycles at t=0 and t=600, nothing in between, and
    /// never two at once.
    #[tokio::test(start_paused = true)]
    async fn test_tick_during_running_cycle_is_dropped() {
        let dir = TempDir::new().unwrap();
        let resolves = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(Duration::from_secs(450), resolves.clone(), &dir);

        scheduler
            .run_until(Ledger::new(), tokio::time::sleep(Duration::from_secs(650)))
            .await;

        assert_eq!(resolves.load(Ordering::SeqCst), 2);
    }
}
