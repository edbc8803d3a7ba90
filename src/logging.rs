//! Console logging for the binary.
//!
//! The library logs through the `log` facade; this installs `env_logger` as
//! the backend. The default level is `info` and `RUST_LOG` overrides it:
//!
//! ```text
//! RUST_LOG=case_insights=debug case-insights render --file rows.json
//! ```

/// Installs the logger. Calling it twice is harmless.
pub fn init() {
    init_with_default("info");
}

pub fn init_with_default(filter: &str) {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init();
    if result.is_err() {
        log::debug!("Logger already initialised");
    }
}
