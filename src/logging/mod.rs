//! Logging setup. The library itself only emits through the `log` facade;
//! binaries install `env_logger` here.

use env_logger::{Builder, Env};

use crate::config::BlogConfig;

/// Install `env_logger` at `level`. `RUST_LOG`, when set, takes precedence.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(level: &str) {
    let env = Env::default().default_filter_or(level);
    if Builder::from_env(env).format_timestamp_millis().try_init().is_err() {
        log::debug!("logger already initialized");
    }
}

pub fn init_from_config(config: &BlogConfig) {
    init(&config.log_level);
}
