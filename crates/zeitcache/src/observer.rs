//! Diagnostic events emitted by the orchestrator.
//!
//! The orchestrator never touches global logging state. It reports what it is
//! doing to a [`CacheObserver`] it was handed at construction; the default
//! [`TracingObserver`] forwards those events to `tracing`.

use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, trace, warn, Level};

/// Something the orchestrator did.
#[derive(Debug, Clone, Copy)]
pub enum CacheEvent<'a> {
    /// A lookup started.
    Lookup { name_hint: &'a str },
    /// The cache key was derived.
    Key { key: &'a str },
    /// An artifact exists for the key.
    Hit { path: &'a Path },
    /// No artifact exists; the transformation will run.
    Miss { path: &'a Path },
    /// The artifact was read and restored.
    Loaded { name_hint: &'a str, kind: &'a str },
    /// A new artifact was written.
    Stored { name_hint: &'a str, kind: &'a str },
}

impl CacheEvent<'_> {
    /// Verbosity the event is reported at.
    pub fn level(&self) -> Level {
        match self {
            CacheEvent::Lookup { .. } | CacheEvent::Loaded { .. } | CacheEvent::Stored { .. } => {
                Level::INFO
            }
            CacheEvent::Key { .. } | CacheEvent::Hit { .. } | CacheEvent::Miss { .. } => {
                Level::DEBUG
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            CacheEvent::Lookup { name_hint } => format!("Checking cache for {}...", name_hint),
            CacheEvent::Key { key } => format!("Hash: {}", key),
            CacheEvent::Hit { path } => format!("Cache hit at {}", path.display()),
            CacheEvent::Miss { path } => {
                format!("No cache at {}, calculating...", path.display())
            }
            CacheEvent::Loaded { name_hint, kind } => {
                format!("Successfully loaded cache for {} ({})", name_hint, kind)
            }
            CacheEvent::Stored { name_hint, kind } => {
                format!("Successfully created cache for {} ({})", name_hint, kind)
            }
        }
    }
}

/// Receiver for orchestrator diagnostics.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent<'_>);
}

/// Forwards events to `tracing`, dropping those more verbose than `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    threshold: LevelFilter,
}

impl TracingObserver {
    pub fn new(threshold: LevelFilter) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> LevelFilter {
        self.threshold
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(crate::config::CacheConfig::DEFAULT_LOG_LEVEL)
    }
}

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent<'_>) {
        let level = event.level();
        if level > self.threshold {
            return;
        }
        let message = event.message();
        match level {
            Level::ERROR => error!("{}", message),
            Level::WARN => warn!("{}", message),
            Level::INFO => info!("{}", message),
            Level::DEBUG => debug!("{}", message),
            _ => trace!("{}", message),
        }
    }
}
