//! zeitcache - Disk-backed memoization for labeled multi-dimensional arrays.
//!
//! Wraps an expensive transformation of a [`DataArray`] or [`Dataset`] so that
//! its result is written to a zstd-compressed file the first time and read
//! back on every later call with equivalent input. The cache key combines a
//! caller-chosen name hint with a fingerprint of the input's metadata.
//!
//! # Example
//!
//! ```rust,ignore
//! use zeitcache::{force, CacheOptions, Data, DataArray, Kwargs};
//!
//! fn mean_over_x(data: Data, _: &Kwargs) -> zeitcache::Result<Data> {
//!     let arr = data.into_array().expect("array input");
//!     Ok(arr.mean("x")?.into())
//! }
//!
//! fn main() -> zeitcache::Result<()> {
//!     zeitcache::logging::init_logging(tracing::level_filters::LevelFilter::INFO);
//!
//!     let spam = DataArray::new(["x"], vec![1i64, 2, 3])?.with_name("spam");
//!     let options = CacheOptions::default().cache_dir("./cache");
//!
//!     // Computed and written on the first run, read from disk afterwards.
//!     let mean = force("spam", spam, mean_over_x, &options)?;
//!     println!("{}", mean.as_array().unwrap().item()?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod observer;
pub mod resolve;

// Re-export commonly used types
pub use api::{delay, force, CachedFn, Memoize, Thunk};
pub use cache::Cache;
pub use config::{CacheConfig, CacheOptions};
pub use dataset::{
    ArrayData, AttrValue, Attrs, Coords, DType, Data, DataArray, Dataset, Kwargs, Variable,
};
pub use error::{Result, ZeitError};
pub use fingerprint::{fingerprint, Fingerprint, FingerprintPolicy};
pub use observer::{CacheEvent, CacheObserver, TracingObserver};
pub use resolve::{classify_value, Kind};
