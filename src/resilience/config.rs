use serde::{Deserialize, Serialize};

/// Configuration for retry and backoff behavior on rate-limited queries.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first request; a query issues at most
    /// `max_attempts + 1` requests
    pub max_attempts: usize,
    /// Backoff delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Whether to subtract random jitter from backoff delays
    pub jitter: bool,
}

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 16_000;

impl RetryConfig {
    /// Creates the default configuration: 3 retries, 1s doubling up to 16s.
    pub fn defaults() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Client-side spacing between outbound queries.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub min_interval_ms: u64,
}

const DEFAULT_MIN_INTERVAL_MS: u64 = 500;

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}
