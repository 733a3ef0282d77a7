//! Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Mintwatch - social feed token monitor
///
/// Polls configured accounts for new posts, matches them against a
/// keyword list, extracts token mint addresses and for each match
/// attempts a swap and sends an email alert. Each post is acted on at
/// most once across restarts.
///
/// Examples:
///   mintwatch --accounts acct1,acct2 --keywords token,mint
///   mintwatch --config mintwatch.toml --once
///   mintwatch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for mintwatch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Generate a default mintwatch.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Account handles to monitor (comma-separated)
    ///
    /// Overrides the config file. Example: --accounts acct1,acct2
    #[arg(
        long,
        value_name = "HANDLES",
        value_delimiter = ',',
        env = "MINTWATCH_ACCOUNTS"
    )]
    pub accounts: Option<Vec<String>>,

    /// Keywords a post must contain (comma-separated)
    ///
    /// Overrides the config file. Example: --keywords token,mint
    #[arg(
        long,
        value_name = "WORDS",
        value_delimiter = ',',
        env = "MINTWATCH_KEYWORDS"
    )]
    pub keywords: Option<Vec<String>>,

    /// Seconds between polling cycles
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Ledger snapshot file path
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Feed API bearer token
    #[arg(long, value_name = "TOKEN", env = "MINTWATCH_FEED_TOKEN", hide_env_values = true)]
    pub feed_token: Option<String>,

    /// Resend API key for email alerts
    #[arg(long, value_name = "KEY", env = "MINTWATCH_RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// Wallet keypair as a JSON array of 64 bytes
    #[arg(long, value_name = "KEY", env = "MINTWATCH_WALLET_KEY", hide_env_values = true)]
    pub wallet_key: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(interval) = self.interval {
            if interval == 0 {
                return Err("Interval must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            once: false,
            init_config: false,
            accounts: None,
            keywords: None,
            interval: None,
            ledger: None,
            feed_token: None,
            resend_api_key: None,
            wallet_key: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut args = make_args();
        args.interval = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
