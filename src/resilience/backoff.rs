use std::time::Duration;

use rand::Rng;

use super::config::RetryConfig;

/// Exponential backoff: `min(base * 2^attempt, cap)`.
///
/// `delay` is pure. Jitter, when enabled, is only applied by
/// [`BackoffPolicy::sleep_duration`] so the schedule itself stays testable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_ms: u64,
    cap_ms: u64,
    jitter: bool,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, cap_ms: u64) -> Self {
        Self {
            base_ms,
            cap_ms,
            jitter: false,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            base_ms: cfg.base_delay_ms,
            cap_ms: cfg.max_delay_ms,
            jitter: cfg.jitter,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay in milliseconds before the retry that follows `attempt`.
    pub fn delay(&self, attempt: usize) -> u64 {
        // 2^63 already saturates any realistic base
        let factor = 1u64 << attempt.min(63);
        self.base_ms.saturating_mul(factor).min(self.cap_ms)
    }

    /// Actual time to suspend for `delay_ms`.
    pub fn sleep_duration(&self, delay_ms: u64) -> Duration {
        if !self.jitter {
            return Duration::from_millis(delay_ms);
        }
        let span = (delay_ms / 2).max(1);
        let jitter = rand::thread_rng().gen_range(0..span);
        Duration::from_millis(delay_ms.saturating_sub(jitter))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::defaults())
    }
}
