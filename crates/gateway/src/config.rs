//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use collector::CollectorConfig;
use providers::{ProviderError, ProviderKind, ProvidersConfig};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory served for paths no route matches.
    pub static_dir: PathBuf,
    /// Provider used by every tactic.
    pub primary: ProviderKind,
    /// Provider the fallback tactic falls back to.
    pub secondary: Option<ProviderKind>,
    /// Provider credentials and endpoints.
    pub providers: ProvidersConfig,
    /// Collector timing and limits.
    pub collector: CollectorConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ADDR` | Bind host | `0.0.0.0` |
    /// | `PORT` | Bind port | `8000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:relay.db?mode=rwc` |
    /// | `STATIC_DIR` | Static file directory | `./ui/build` |
    /// | `TRANSACTION_RETRIES` | Retry attempt limit | `3` |
    /// | `TRANSACTION_QUEUE` | Max concurrent dispatch workers | `10` |
    /// | `CLAIM_TTL_SECS` | Claim expiry in seconds | `60` |
    /// | `PRIMARY_PROVIDER` | `easysms`, `nexmo`, `smsapi` or `signal` | `easysms` |
    /// | `SECONDARY_PROVIDER` | Fallback provider | (none) |
    /// | `EASYSMS_KEY` | Easysms API key | (none) |
    /// | `NEXMO_KEY` / `NEXMO_SECRET` | Nexmo credentials | (none) |
    /// | `SMSAPI_TOKEN` | SMSAPI token | (none) |
    /// | `SIGNAL_DAEMON_URL` | signal-cli daemon URL | (none) |
    /// | `SIGNAL_ACCOUNT` | signal-cli account number | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(format!("{}:{}", host, port)))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:relay.db?mode=rwc".to_string());

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./ui/build"));

        let mut collector = CollectorConfig::default();
        if let Some(retries) = parse_var::<i64>("TRANSACTION_RETRIES")? {
            collector.retry_limit = retries;
        }
        if let Some(queue) = parse_var::<usize>("TRANSACTION_QUEUE")? {
            collector.max_in_flight = queue.max(1);
        }
        if let Some(ttl) = parse_var::<u64>("CLAIM_TTL_SECS")? {
            collector.claim_ttl = Duration::from_secs(ttl);
        }

        let primary = match optional_var("PRIMARY_PROVIDER") {
            Some(name) => name.parse()?,
            None => ProviderKind::Easysms,
        };
        let secondary = optional_var("SECONDARY_PROVIDER")
            .map(|name| name.parse::<ProviderKind>())
            .transpose()?;

        let chain_len = 1 + usize::from(secondary.is_some());
        check_claim_ttl(&collector, chain_len)?;

        let providers = ProvidersConfig {
            easysms_key: optional_var("EASYSMS_KEY"),
            nexmo_key: optional_var("NEXMO_KEY"),
            nexmo_secret: optional_var("NEXMO_SECRET"),
            smsapi_token: optional_var("SMSAPI_TOKEN"),
            signal_daemon_url: optional_var("SIGNAL_DAEMON_URL"),
            signal_account: optional_var("SIGNAL_ACCOUNT"),
            ..Default::default()
        };

        Ok(Self {
            addr,
            database_url,
            static_dir,
            primary,
            secondary,
            providers,
            collector,
        })
    }
}

/// Reject a claim TTL that a worker can outlast while still walking its chain.
///
/// Such a claim would be reclaimed and dispatched again on every slow delivery.
fn check_claim_ttl(collector: &CollectorConfig, chain_len: usize) -> Result<(), ConfigError> {
    if collector.claim_ttl_covers(chain_len) {
        return Ok(());
    }

    Err(ConfigError::ClaimTtlTooShort {
        ttl_secs: collector.claim_ttl.as_secs(),
        needed_secs: collector.worst_case_dispatch(chain_len).as_secs(),
    })
}

/// Read a variable, treating empty values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    optional_var(name)
        .map(|value| match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::InvalidNumber { name, value }),
        })
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidAddr(String),

    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("CLAIM_TTL_SECS ({ttl_secs}) must be greater than {needed_secs}, the longest a provider chain can take")]
    ClaimTtlTooShort { ttl_secs: u64, needed_secs: u64 },

    #[error("Provider configuration: {0}")]
    Provider(#[from] ProviderError),
}
