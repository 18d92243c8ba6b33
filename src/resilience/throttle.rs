use std::sync::Mutex;

use tokio::time::Instant;

use super::config::ThrottleConfig;

/// Enforces a minimum spacing between outbound queries.
///
/// A denied acquisition is only a signal; nothing is queued. Share one
/// instance through `Arc` to throttle several sessions together; they all
/// read time from the throttle's own origin.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval_ms: u64,
    origin: Instant,
    last_acquired_at_ms: Mutex<Option<u64>>,
}

impl RequestThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            origin: Instant::now(),
            last_acquired_at_ms: Mutex::new(None),
        }
    }

    pub fn from_config(cfg: &ThrottleConfig) -> Self {
        Self::new(cfg.min_interval_ms)
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Milliseconds since this throttle was created.
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// [`try_acquire`](Self::try_acquire) at the throttle's current time.
    pub fn try_acquire_now(&self) -> bool {
        self.try_acquire(self.now_ms())
    }

    /// Returns true and records `now_ms` if enough time passed since the last
    /// allowed acquisition.
    pub fn try_acquire(&self, now_ms: u64) -> bool {
        let mut last = self
            .last_acquired_at_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let allowed = match *last {
            None => true,
            Some(prev) => now_ms.saturating_sub(prev) >= self.min_interval_ms,
        };
        if allowed {
            *last = Some(now_ms);
        } else {
            log::debug!("throttle denied acquisition at {now_ms}ms");
        }
        allowed
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}
