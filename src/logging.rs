//! Logger setup
//!
//! Everything logs through the `log` facade; `env_logger` writes to stderr.
//! `RUST_LOG` always wins over the configured default.

/// Default filter when `RUST_LOG` is not set
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global logger; later calls are ignored
pub fn init(debug: bool) {
    let env = env_logger::Env::default().default_filter_or(default_filter(debug));
    let _ = env_logger::Builder::from_env(env).try_init();
}
