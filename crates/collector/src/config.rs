//! Collector configuration.

use std::time::Duration;

/// Timing and capacity settings for the collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// How often pending transactions are claimed and dispatched.
    /// Default: 2 seconds.
    pub dispatch_interval: Duration,

    /// How often failed and timed-out transactions are reclaimed.
    /// Default: 4 seconds.
    pub reclaim_interval: Duration,

    /// How long a claim holds before the timeout reclaim may take it back.
    /// Default: 60 seconds.
    pub claim_ttl: Duration,

    /// A failed transaction is retried while its attempts stay below this.
    /// Default: 3.
    pub retry_limit: i64,

    /// Upper bound on concurrently running dispatch workers.
    /// Default: 10.
    pub max_in_flight: usize,

    /// Timeout for a single provider call. An elapsed call counts as a failure.
    /// Default: 10 seconds.
    pub provider_timeout: Duration,

    /// How long shutdown waits for in-flight workers.
    /// Default: 30 seconds.
    pub drain_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: Duration::from_secs(2),
            reclaim_interval: Duration::from_secs(4),
            claim_ttl: Duration::from_secs(60),
            retry_limit: 3,
            max_in_flight: 10,
            provider_timeout: Duration::from_secs(10),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl CollectorConfig {
    /// Claim TTL in whole seconds, as stored in the `timeout` column.
    pub fn claim_ttl_secs(&self) -> i64 {
        i64::try_from(self.claim_ttl.as_secs()).unwrap_or(i64::MAX)
    }

    /// Longest time a worker can spend on a chain of `chain_len` providers.
    pub fn worst_case_dispatch(&self, chain_len: usize) -> Duration {
        self.provider_timeout
            .saturating_mul(u32::try_from(chain_len).unwrap_or(u32::MAX))
    }

    /// Whether a claim outlives the slowest possible dispatch, so that timeout
    /// reclaim only takes back claims whose worker is gone.
    pub fn claim_ttl_covers(&self, chain_len: usize) -> bool {
        self.claim_ttl > self.worst_case_dispatch(chain_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.claim_ttl_secs(), 60);
        assert_eq!(config.retry_limit, 3);
        assert!(config.dispatch_interval < config.reclaim_interval);
        assert!(config.claim_ttl_covers(2));
    }

    #[test]
    fn test_claim_ttl_must_outlive_chain() {
        let config = CollectorConfig {
            claim_ttl: Duration::from_secs(20),
            provider_timeout: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(config.worst_case_dispatch(2), Duration::from_secs(20));
        assert!(config.claim_ttl_covers(1));
        assert!(!config.claim_ttl_covers(2));
    }
}
