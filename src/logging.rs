//! Logging setup for the library and the `empirbus-cli` binary.
//!
//! Library code logs through the `log` facade. Frame hex dumps go to the
//! `empirbus::frame` target so they can be enabled on their own, e.g.
//! `RUST_LOG=info,empirbus::frame=debug`.

use env_logger::{Builder, Env, TimestampPrecision};
use log::LevelFilter;

/// Log target of the helpers below
pub const LOG_TARGET: &str = "empirbus";

/// Initializes `env_logger` with an `info` default.
///
/// `RUST_LOG` overrides the default. Calling it more than once is harmless.
pub fn init_logger() {
    init_with(None);
}

/// Initializes `env_logger` at `level` unless `RUST_LOG` is set.
pub fn init_logger_with_level(level: LevelFilter) {
    init_with(Some(level));
}

fn init_with(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if let (Some(level), Err(_)) = (level, std::env::var("RUST_LOG")) {
        builder.filter_level(level);
    }
    // Bus traffic arrives in bursts; millisecond stamps keep frames apart
    builder.format_timestamp(Some(TimestampPrecision::Millis));
    let _ = builder.try_init();
}

/// Maps a `-v` count to a level: 0 = info, 1 = debug, 2+ = trace.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn log_error(message: &str) {
    log::error!(target: LOG_TARGET, "{message}");
}

pub fn log_warn(message: &str) {
    log::warn!(target: LOG_TARGET, "{message}");
}

pub fn log_info(message: &str) {
    log::info!(target: LOG_TARGET, "{message}");
}

pub fn log_debug(message: &str) {
    log::debug!(target: LOG_TARGET, "{message}");
}
