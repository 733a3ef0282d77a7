//! Error taxonomy for the monitoring pipeline.
//!
//! Every variant here is isolated by the cycle runner: a resolution or
//! fetch failure skips one account, an action failure skips one swap or
//! notification, a persistence failure leaves the on-disk snapshot stale.
//! None of them may terminate the scheduler loop. Configuration problems
//! are not part of this taxonomy — they are fatal at startup, before any
//! cycle runs, and are surfaced through `anyhow` from `Config::validate`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Account handle could not be resolved to a provider id.
    #[error("failed to resolve @{handle}: {reason}")]
    Resolution { handle: String, reason: String },

    /// Feed source was unreachable or returned an error for an account.
    #[error("failed to fetch posts for @{handle}: {source:#}")]
    Fetch {
        handle: String,
        #[source]
        source: anyhow::Error,
    },

    /// A notifier or actuator invocation failed.
    #[error("{action} failed for post {post_id}: {source:#}")]
    Action {
        action: &'static str,
        post_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The ledger snapshot could not be written.
    #[error("failed to persist ledger: {source:#}")]
    Persistence {
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_account() {
        let err = MonitorError::Resolution {
            handle: "acct1".to_string(),
            reason: "handle not found".to_string(),
        };
        assert!(err.to_string().contains("@acct1"));

        let err = MonitorError::Fetch {
            handle: "acct2".to_string(),
            source: anyhow::anyhow!("connection refused"),
        };
        assert!(err.to_string().contains("@acct2"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_action_error_names_the_action() {
        let err = MonitorError::Action {
            action: "swap",
            post_id: "12345".to_string(),
            source: anyhow::anyhow!("no route"),
        };
        let text = err.to_string();
        assert!(text.contains("swap"));
        assert!(text.contains("12345"));
    }
}
