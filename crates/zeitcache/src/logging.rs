//! Process-wide logging setup.
//!
//! The library itself only emits `tracing` events. Host programs call one of
//! these once at start-up to get them printed.

use crate::config::CacheConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a compact stderr subscriber at `level`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(level: LevelFilter) -> bool {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_ok()
}

/// Install a subscriber filtered by the `ZEITCACHE_LOG` directive, falling
/// back to `warn`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_from_env() -> bool {
    let filter = EnvFilter::try_from_env(CacheConfig::ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(CacheConfig::DEFAULT_LOG_LEVEL.to_string()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_ok()
}
