//! Centralized configuration for zeitcache.
//!
//! Constants describing the on-disk layout, plus [`CacheOptions`], the
//! per-call settings shared by every entry point.

use crate::dataset::{AttrValue, Kwargs};
use crate::error::{Result, ZeitError};
use crate::fingerprint::FingerprintPolicy;
use crate::observer::CacheObserver;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

/// On-disk layout and codec constants.
pub struct CacheConfig;

impl CacheConfig {
    pub const DEFAULT_CACHE_DIR: &'static str = "./cache";
    /// Extension of the uncompressed container.
    pub const CONTAINER_EXT: &'static str = "ztc";
    /// Suffix appended to the container name once compressed.
    pub const COMPRESSED_SUFFIX: &'static str = ".zstd";
    pub const TEMP_PREFIX: &'static str = ".zeitcache-";
    pub const TEMP_SUFFIX: &'static str = ".tmp";
    pub const DEFAULT_COMPRESSION_LEVEL: i32 = zstd::DEFAULT_COMPRESSION_LEVEL;
    pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;

    /// Collection attribute marking a stored collection as a promoted array.
    pub const PROVENANCE_ATTR: &'static str = "_zeitcache_type";
    pub const PROVENANCE_SINGLE: &'static str = "DataArray";

    // Environment overrides
    pub const ENV_CACHE_DIR: &'static str = "ZEITCACHE_DIR";
    pub const ENV_LOG: &'static str = "ZEITCACHE_LOG";
    pub const ENV_COMPRESSION_LEVEL: &'static str = "ZEITCACHE_COMPRESSION_LEVEL";
}

/// Settings for one cached computation.
///
/// # Example
///
/// ```rust,ignore
/// let options = CacheOptions::default()
///     .cache_dir("/scratch/cache")
///     .log_level(LevelFilter::DEBUG)
///     .kwarg("dim", "x");
/// ```
#[derive(Clone)]
pub struct CacheOptions {
    pub cache_dir: PathBuf,
    pub log_level: LevelFilter,
    pub kwargs: Kwargs,
    pub fingerprint_policy: FingerprintPolicy,
    pub compression_level: i32,
    /// Receives lookup/hit/miss events. `None` uses a tracing observer at
    /// `log_level`.
    pub observer: Option<Arc<dyn CacheObserver>>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(CacheConfig::DEFAULT_CACHE_DIR),
            log_level: CacheConfig::DEFAULT_LOG_LEVEL,
            kwargs: Kwargs::new(),
            fingerprint_policy: FingerprintPolicy::default(),
            compression_level: CacheConfig::DEFAULT_COMPRESSION_LEVEL,
            observer: None,
        }
    }
}

impl std::fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOptions")
            .field("cache_dir", &self.cache_dir)
            .field("log_level", &self.log_level)
            .field("kwargs", &self.kwargs)
            .field("fingerprint_policy", &self.fingerprint_policy)
            .field("compression_level", &self.compression_level)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl CacheOptions {
    /// Defaults overridden by `ZEITCACHE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `ZEITCACHE_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(dir) = lookup(CacheConfig::ENV_CACHE_DIR).filter(|d| !d.is_empty()) {
            options.cache_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup(CacheConfig::ENV_LOG) {
            options.log_level = LevelFilter::from_str(level.trim()).map_err(|e| {
                ZeitError::config(format!(
                    "{} must be a log level, got {:?}: {}",
                    CacheConfig::ENV_LOG,
                    level,
                    e
                ))
            })?;
        }

        if let Some(level) = lookup(CacheConfig::ENV_COMPRESSION_LEVEL) {
            let parsed: i32 = level.trim().parse().map_err(|_| {
                ZeitError::config(format!(
                    "{} must be an integer, got {:?}",
                    CacheConfig::ENV_COMPRESSION_LEVEL,
                    level
                ))
            })?;
            options.compression_level = checked_level(parsed)?;
        }

        Ok(options)
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn fingerprint_policy(mut self, policy: FingerprintPolicy) -> Self {
        self.fingerprint_policy = policy;
        self
    }

    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Check settings that can only be validated at run time.
    pub fn validate(&self) -> Result<()> {
        checked_level(self.compression_level)?;
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ZeitError::config("cache_dir must not be empty"));
        }
        Ok(())
    }
}

fn checked_level(level: i32) -> Result<i32> {
    let range = zstd::compression_level_range();
    if range.contains(&level) {
        Ok(level)
    } else {
        Err(ZeitError::config(format!(
            "compression level {} outside supported range {:?}",
            level, range
        )))
    }
}
