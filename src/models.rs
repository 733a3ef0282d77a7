//! Core data types shared across the pipeline.

use chrono::{DateTime, Utc};

/// A single post pulled from the feed source.
///
/// Ephemeral: constructed from a poll response and discarded once the
/// cycle has processed it. Only the id outlives the cycle, via the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostItem {
    /// Provider-assigned post identifier.
    pub id: String,
    /// Full post text.
    pub text: String,
    /// Provider timestamp, kept verbatim.
    pub timestamp: String,
}

/// What happened when a matched post was dispatched.
///
/// Used for logging and cycle stats only; never persisted.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    /// Id of the post this outcome belongs to.
    pub post_id: String,
    /// Mint addresses extracted from the post text, in order of appearance.
    pub addresses: Vec<String>,
    /// Number of swap invocations attempted.
    pub swaps_attempted: usize,
    /// Number of swap invocations that failed.
    pub swaps_failed: usize,
    /// Whether the notification went through.
    pub notified: bool,
}

/// Counters for one full pass over all monitored accounts.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// Accounts polled successfully.
    pub accounts_polled: usize,
    /// Accounts skipped because resolution or the fetch failed.
    pub accounts_skipped: usize,
    /// Posts returned by the feed source, before dedup.
    pub posts_seen: usize,
    /// Posts that passed dedup and the keyword filter.
    pub posts_matched: usize,
    /// Per-post dispatch outcomes.
    pub outcomes: Vec<ActionOutcome>,
}

impl CycleStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            accounts_polled: 0,
            accounts_skipped: 0,
            posts_seen: 0,
            posts_matched: 0,
            outcomes: Vec::new(),
        }
    }

    /// Seconds elapsed since the cycle started.
    pub fn elapsed_seconds(&self) -> f64 {
        (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_stats_start_empty() {
        let stats = CycleStats::new();
        assert_eq!(stats.accounts_polled, 0);
        assert_eq!(stats.posts_matched, 0);
        assert!(stats.outcomes.is_empty());
    }
}
