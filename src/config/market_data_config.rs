//! Quote repository configuration parsing from environment variables.

use crate::domain::ml::DEFAULT_MIN_HISTORY;
use std::env;
use std::time::Duration;

/// Market data environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataEnvConfig {
    pub quote_min_interval_ms: u64,
    pub quote_cache_ttl_secs: u64,
    pub prediction_min_history: usize,
}

impl Default for MarketDataEnvConfig {
    fn default() -> Self {
        Self {
            quote_min_interval_ms: 2000,
            quote_cache_ttl_secs: 300,
            prediction_min_history: DEFAULT_MIN_HISTORY,
        }
    }
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            quote_min_interval_ms: lookup("QUOTE_MIN_INTERVAL_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.quote_min_interval_ms),
            quote_cache_ttl_secs: lookup("QUOTE_CACHE_TTL_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.quote_cache_ttl_secs),
            prediction_min_history: lookup("PREDICTION_MIN_HISTORY")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.prediction_min_history),
        }
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.quote_min_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_cache_ttl_secs)
    }
}
