//! Optional logger setup for hosts that do not install their own.

/// Initializes `env_logger`, honoring `RUST_LOG` and defaulting to `info`.
///
/// Calling it more than once is harmless.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
