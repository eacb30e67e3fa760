//! On-disk representation of cached collections.
//!
//! [`container`] is the uncompressed binary layout; [`artifact`] wraps it in
//! zstd and handles atomic placement on disk.

pub mod artifact;
pub mod container;

pub use artifact::{artifact_exists, artifact_file, read_artifact, write_artifact};
