//! Cache orchestrator.
//!
//! Every entry point in [`crate::api`] ends up in [`Cache::invoke`], which
//! decides between the read path and the compute-then-write path.

use crate::codec::{artifact_exists, read_artifact, write_artifact};
use crate::config::{CacheConfig, CacheOptions};
use crate::dataset::{Data, Kwargs};
use crate::error::{Result, ZeitError};
use crate::fingerprint::fingerprint;
use crate::observer::{CacheEvent, CacheObserver, TracingObserver};
use crate::resolve::{classify_and_normalize, Normalized};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Disk-backed memoization of transformations over labeled arrays.
///
/// The cache key is `{name_hint}_{fingerprint}` where the fingerprint is
/// taken from the *input* data, so a hit skips the transformation entirely.
/// There is no manifest: an artifact existing on disk is the index.
///
/// # Example
///
/// ```rust,ignore
/// let cache = Cache::new(CacheOptions::default().cache_dir("./cache"))?;
/// let mean = cache.invoke("spam", data, |d, _| d.into_array().unwrap().mean("x").map(Data::from))?;
/// ```
pub struct Cache {
    options: CacheOptions,
    observer: Arc<dyn CacheObserver>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Cache {
    /// Create a cache from validated options.
    ///
    /// Events go to `options.observer`, or to a [`TracingObserver`] at
    /// `options.log_level` when none is set.
    pub fn new(options: CacheOptions) -> Result<Self> {
        options.validate()?;
        let observer = match &options.observer {
            Some(observer) => Arc::clone(observer),
            None => Arc::new(TracingObserver::new(options.log_level)),
        };
        Ok(Self { options, observer })
    }

    /// Replace the observer receiving lookup events.
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn cache_dir(&self) -> &Path {
        &self.options.cache_dir
    }

    /// Cache key for `data` under `name_hint`.
    pub fn key(&self, name_hint: &str, data: &Data) -> String {
        format!(
            "{}_{}",
            name_hint,
            fingerprint(data, self.options.fingerprint_policy)
        )
    }

    /// Uncompressed base path for `key`; the artifact adds a `.zstd` suffix.
    pub fn base_path(&self, key: &str) -> PathBuf {
        self.options
            .cache_dir
            .join(format!("{}.{}", key, CacheConfig::CONTAINER_EXT))
    }

    /// Return the cached result of `transform(data, kwargs)`, computing and
    /// storing it first if no artifact exists for `data`.
    ///
    /// Both paths return the same shape: a single array comes back as
    /// [`Data::Array`], a collection as [`Data::Dataset`].
    pub fn invoke<F>(&self, name_hint: &str, data: Data, transform: F) -> Result<Data>
    where
        F: FnOnce(Data, &Kwargs) -> Result<Data>,
    {
        self.run(name_hint, data, Some(transform))
    }

    /// Persist `data` itself under `name_hint`, or load it if already stored.
    pub fn store(&self, name_hint: &str, data: Data) -> Result<Data> {
        self.run(name_hint, data, None::<fn(Data, &Kwargs) -> Result<Data>>)
    }

    fn run<F>(&self, name_hint: &str, data: Data, transform: Option<F>) -> Result<Data>
    where
        F: FnOnce(Data, &Kwargs) -> Result<Data>,
    {
        validate_name_hint(name_hint)?;
        self.emit(CacheEvent::Lookup { name_hint });
        self.ensure_dir()?;

        let key = self.key(name_hint, &data);
        self.emit(CacheEvent::Key { key: &key });
        let base = self.base_path(&key);

        if artifact_exists(&base) {
            self.emit(CacheEvent::Hit { path: &base });
            let cached = read_artifact(&base)?;
            self.emit(CacheEvent::Loaded {
                name_hint,
                kind: cached.type_label(),
            });
            return Ok(cached);
        }

        self.emit(CacheEvent::Miss { path: &base });
        let result = match transform {
            Some(f) => f(data, &self.options.kwargs)?,
            None => data,
        };

        let mut normalized = classify_and_normalize(result)?;
        normalized.stamp_provenance();
        let Normalized {
            kind,
            member,
            collection,
        } = normalized;
        let collection =
            write_artifact(collection, &member, &base, self.options.compression_level)?;
        self.emit(CacheEvent::Stored {
            name_hint,
            kind: kind.as_str(),
        });

        Normalized {
            kind,
            member,
            collection,
        }
        .restore()
    }

    /// Create the cache directory if needed. Safe to call repeatedly.
    pub fn ensure_dir(&self) -> Result<()> {
        let dir = &self.options.cache_dir;
        if dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| {
            let message = if e.kind() == ErrorKind::PermissionDenied {
                format!(
                    "Permission denied creating cache directory {}",
                    dir.display()
                )
            } else {
                format!("Failed to create cache directory {}", dir.display())
            };
            ZeitError::Io {
                message,
                path: Some(dir.clone()),
                source: Some(e),
            }
        })
    }

    fn emit(&self, event: CacheEvent<'_>) {
        self.observer.on_event(&event);
    }
}

/// Name hints become file name prefixes and must stay inside the cache
/// directory.
pub fn validate_name_hint(name_hint: &str) -> Result<()> {
    if name_hint.is_empty() {
        return Err(ZeitError::config("name_hint must not be empty"));
    }
    if name_hint == "." || name_hint == ".." {
        return Err(ZeitError::config(format!(
            "name_hint {:?} is not a valid file name prefix",
            name_hint
        )));
    }
    if name_hint.contains(['/', '\\']) {
        return Err(ZeitError::config(format!(
            "name_hint {:?} must not contain path separators",
            name_hint
        )));
    }
    Ok(())
}
