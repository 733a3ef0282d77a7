//! Configuration file handling.
//!
//! Settings come from `mintwatch.toml`, layered under CLI/environment
//! overrides. Credentials are never written out by `default_toml`; they
//! are expected from the environment (or CLI) and merged in at startup.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Accounts, keywords and polling cadence.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Feed source settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Email notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Swap execution settings.
    #[serde(default)]
    pub actuate: ActuateConfig,

    /// Ledger persistence settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// What to watch and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Account handles to poll, in order.
    #[serde(default)]
    pub accounts: Vec<String>,

    /// Literal keywords a post must contain to be dispatched.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Seconds between cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Recent posts fetched per account per cycle.
    #[serde(default = "default_fetch_count")]
    pub fetch_count: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            keywords: Vec::new(),
            poll_interval_seconds: default_poll_interval(),
            fetch_count: default_fetch_count(),
        }
    }
}

fn default_poll_interval() -> u64 {
    300
}

fn default_fetch_count() -> usize {
    2
}

/// Feed source (Twitter API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// REST API base URL.
    #[serde(default = "default_feed_api_base")]
    pub api_base: String,

    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,

    /// Bearer token. Normally supplied via MINTWATCH_FEED_TOKEN.
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: default_feed_api_base(),
            timeout_seconds: default_http_timeout(),
            bearer_token: None,
        }
    }
}

fn default_feed_api_base() -> String {
    "https://api.twitter.com/1.1".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

/// Email notification (Resend API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Who receives the alerts.
    #[serde(default)]
    pub recipient: String,

    /// Sender address, must belong to a domain verified with Resend.
    #[serde(default)]
    pub from: String,

    /// Resend API base URL.
    #[serde(default = "default_notify_api_base")]
    pub api_base: String,

    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,

    /// API key. Normally supplied via MINTWATCH_RESEND_API_KEY.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            from: String::new(),
            api_base: default_notify_api_base(),
            timeout_seconds: default_http_timeout(),
            api_key: None,
        }
    }
}

fn default_notify_api_base() -> String {
    "https://api.resend.com".to_string()
}

/// Swap execution (Jupiter + Solana RPC) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuateConfig {
    /// USD value of each swap attempt.
    #[serde(default = "default_amount_usd")]
    pub amount_usd: f64,

    /// Allowed slippage in basis points.
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,

    /// Jupiter quote/swap API base URL.
    #[serde(default = "default_quote_api")]
    pub quote_api: String,

    /// Jupiter price API base URL.
    #[serde(default = "default_price_api")]
    pub price_api: String,

    /// Solana RPC endpoint transactions are submitted to.
    #[serde(default = "default_rpc_endpoint")]
    pub rpc_endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_swap_timeout")]
    pub timeout_seconds: u64,

    /// Wallet keypair as a JSON array of 64 bytes. Normally supplied via
    /// MINTWATCH_WALLET_KEY.
    #[serde(default, skip_serializing)]
    pub wallet_key: Option<String>,
}

impl Default for ActuateConfig {
    fn default() -> Self {
        Self {
            amount_usd: default_amount_usd(),
            slippage_bps: default_slippage_bps(),
            quote_api: default_quote_api(),
            price_api: default_price_api(),
            rpc_endpoint: default_rpc_endpoint(),
            timeout_seconds: default_swap_timeout(),
            wallet_key: None,
        }
    }
}

fn default_amount_usd() -> f64 {
    20.0
}

fn default_slippage_bps() -> u32 {
    1500
}

fn default_quote_api() -> String {
    "https://quote-api.jup.ag/v6".to_string()
}

fn default_price_api() -> String {
    "https://price.jup.ag/v6".to_string()
}

fn default_rpc_endpoint() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_swap_timeout() -> u64 {
    60
}

/// Ledger persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Snapshot file path.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("processed-posts.json")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists
    /// but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new("mintwatch.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their env fallbacks) take precedence over the
    /// config file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref accounts) = args.accounts {
            self.monitor.accounts = accounts.clone();
        }
        if let Some(ref keywords) = args.keywords {
            self.monitor.keywords = keywords.clone();
        }
        if let Some(interval) = args.interval {
            self.monitor.poll_interval_seconds = interval;
        }
        if let Some(ref path) = args.ledger {
            self.ledger.path = path.clone();
        }

        if let Some(ref token) = args.feed_token {
            self.feed.bearer_token = Some(token.clone());
        }
        if let Some(ref key) = args.resend_api_key {
            self.notify.api_key = Some(key.clone());
        }
        if let Some(ref key) = args.wallet_key {
            self.actuate.wallet_key = Some(key.clone());
        }
    }

    /// Check everything a cycle will rely on. Called once at startup,
    /// before any cycle runs; failures here are fatal.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.accounts.is_empty() {
            bail!("no accounts configured: set [monitor] accounts or --accounts");
        }
        if self.monitor.accounts.iter().any(|a| a.trim().is_empty()) {
            bail!("account handles must not be empty");
        }
        if self.monitor.keywords.iter().any(|k| k.is_empty()) {
            bail!("empty keyword strings are not allowed (they match every post)");
        }
        if self.monitor.poll_interval_seconds == 0 {
            bail!("poll interval must be at least 1 second");
        }
        if self.monitor.fetch_count == 0 {
            bail!("fetch count must be at least 1");
        }

        if self.feed.bearer_token.as_deref().unwrap_or("").is_empty() {
            bail!("feed bearer token missing: set MINTWATCH_FEED_TOKEN");
        }

        if self.notify.recipient.is_empty() {
            bail!("notification recipient missing: set [notify] recipient");
        }
        if self.notify.from.is_empty() {
            bail!("notification sender missing: set [notify] from");
        }
        if self.notify.api_key.as_deref().unwrap_or("").is_empty() {
            bail!("Resend API key missing: set MINTWATCH_RESEND_API_KEY");
        }

        if !(self.actuate.amount_usd > 0.0) {
            bail!("swap amount must be positive");
        }
        if self.actuate.slippage_bps > 10_000 {
            bail!("slippage cannot exceed 10000 bps");
        }
        if self.actuate.wallet_key.as_deref().unwrap_or("").is_empty() {
            bail!("wallet key missing: set MINTWATCH_WALLET_KEY");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
