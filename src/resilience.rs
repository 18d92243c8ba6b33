#[path = "resilience/config.rs"]
mod config;

#[path = "resilience/backoff.rs"]
mod backoff;

#[path = "resilience/throttle.rs"]
mod throttle;

pub use backoff::BackoffPolicy;
pub use config::{RetryConfig, ThrottleConfig};
pub use throttle::RequestThrottle;
