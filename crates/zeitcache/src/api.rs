//! The three ways to cache a computation.
//!
//! - [`force`] applies a function now.
//! - [`Memoize`] binds a function once and returns a reusable [`CachedFn`].
//! - [`delay`] binds the data first and takes the function later.
//!
//! All of them run through [`Cache::invoke`] with identical semantics.

use crate::cache::Cache;
use crate::config::CacheOptions;
use crate::dataset::{AttrValue, Data, Kwargs};
use crate::error::{Result, ZeitError};
use crate::fingerprint::FingerprintPolicy;
use crate::observer::CacheObserver;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

/// Apply `f` to `data` through the cache immediately.
///
/// # Example
///
/// ```rust,ignore
/// let out = zeitcache::force("spam", spam, mean_over_x, &CacheOptions::default())?;
/// ```
pub fn force<F>(
    name_hint: &str,
    data: impl Into<Data>,
    f: F,
    options: &CacheOptions,
) -> Result<Data>
where
    F: FnOnce(Data, &Kwargs) -> Result<Data>,
{
    Cache::new(options.clone())?.invoke(name_hint, data.into(), f)
}

/// Builder for a cached function.
///
/// # Example
///
/// ```rust,ignore
/// let mean_it = Memoize::new("eggs")
///     .cache_dir(scratch)
///     .log_level(LevelFilter::DEBUG)
///     .bind(|data, _| mean_over_x(data))?;
///
/// let out = mean_it.call(eggs)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Memoize {
    name_hint: Option<String>,
    options: CacheOptions,
}

impl Memoize {
    pub fn new(name_hint: impl Into<String>) -> Self {
        Self {
            name_hint: Some(name_hint.into()),
            options: CacheOptions::default(),
        }
    }

    /// A builder with no name hint. [`Memoize::bind`] rejects it.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Replace all options at once.
    pub fn options(mut self, options: CacheOptions) -> Self {
        self.options = options;
        self
    }

    /// Default: `./cache`
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.cache_dir(dir);
        self
    }

    /// Default: `WARN`
    pub fn log_level(mut self, level: LevelFilter) -> Self {
        self.options = self.options.log_level(level);
        self
    }

    pub fn kwargs(mut self, kwargs: Kwargs) -> Self {
        self.options = self.options.kwargs(kwargs);
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.options = self.options.kwarg(key, value);
        self
    }

    pub fn fingerprint_policy(mut self, policy: FingerprintPolicy) -> Self {
        self.options = self.options.fingerprint_policy(policy);
        self
    }

    pub fn compression_level(mut self, level: i32) -> Self {
        self.options = self.options.compression_level(level);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.options = self.options.observer(observer);
        self
    }

    /// Wrap `f` so that every call goes through the cache.
    pub fn bind<F>(self, f: F) -> Result<CachedFn<F>>
    where
        F: Fn(Data, &Kwargs) -> Result<Data>,
    {
        let name_hint = self.name_hint.ok_or_else(|| {
            ZeitError::config(
                "a name hint is mandatory; use Memoize::new(name_hint) instead of Memoize::bare()",
            )
        })?;
        crate::cache::validate_name_hint(&name_hint)?;
        Ok(CachedFn {
            name_hint,
            cache: Cache::new(self.options)?,
            f,
        })
    }
}

/// A function bound to a cache by [`Memoize::bind`].
pub struct CachedFn<F> {
    name_hint: String,
    cache: Cache,
    f: F,
}

impl<F> CachedFn<F>
where
    F: Fn(Data, &Kwargs) -> Result<Data>,
{
    pub fn call(&self, data: impl Into<Data>) -> Result<Data> {
        self.cache
            .invoke(&self.name_hint, data.into(), |data, kwargs| (self.f)(data, kwargs))
    }

    pub fn name_hint(&self) -> &str {
        &self.name_hint
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

impl<F> std::fmt::Debug for CachedFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedFn")
            .field("name_hint", &self.name_hint)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Bind `data` now and supply the function later with [`Thunk::apply`].
pub fn delay(name_hint: impl Into<String>, data: impl Into<Data>, options: CacheOptions) -> Thunk {
    Thunk {
        name_hint: name_hint.into(),
        data: data.into(),
        options,
    }
}

/// Data waiting for a function. See [`delay`].
#[derive(Debug, Clone)]
pub struct Thunk {
    name_hint: String,
    data: Data,
    options: CacheOptions,
}

impl Thunk {
    /// Same as [`force`] with the bound name hint, data and options.
    pub fn apply<F>(&self, f: F) -> Result<Data>
    where
        F: FnOnce(Data, &Kwargs) -> Result<Data>,
    {
        force(&self.name_hint, self.data.clone(), f, &self.options)
    }

    pub fn name_hint(&self) -> &str {
        &self.name_hint
    }

    pub fn data(&self) -> &Data {
        &self.data
    }
}
