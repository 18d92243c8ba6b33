use std::sync::Arc;

use crate::resilience::RequestThrottle;

use super::bridge_builder::BridgeBuilder;

impl BridgeBuilder {
    /// Sets the number of retries after a rate-limited first request.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.state.config.retry.max_attempts = attempts;
        self
    }

    /// Sets base and max backoff delays in milliseconds.
    pub fn backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.state.config.retry.base_delay_ms = base_delay_ms;
        self.state.config.retry.max_delay_ms = max_delay_ms;
        self
    }

    /// Sets jitter toggle for backoff.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.state.config.retry.jitter = jitter;
        self
    }

    /// Sets the minimum spacing between queries in milliseconds.
    pub fn min_interval_ms(mut self, min_interval_ms: u64) -> Self {
        self.state.config.throttle.min_interval_ms = min_interval_ms;
        self
    }

    /// Shares an existing throttle, e.g. across several sessions.
    pub fn throttle(mut self, throttle: Arc<RequestThrottle>) -> Self {
        self.state.throttle = Some(throttle);
        self
    }
}
