//! Compressed artifacts on disk.
//!
//! Writes are atomic:
//! 1. Encode and zstd-compress into a temp file in the destination directory
//! 2. fsync the temp file
//! 3. Rename it onto the final path
//!
//! Readers therefore only ever see complete artifacts. A failed write leaves
//! nothing behind; the temp file is removed when it is dropped.

use super::container;
use crate::config::CacheConfig;
use crate::dataset::{Data, Dataset};
use crate::error::{Result, ZeitError};
use crate::resolve::restore_from_storage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Path of the compressed artifact for an uncompressed base path.
pub fn artifact_file(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(CacheConfig::COMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// Returns true if a finished artifact exists for `base`.
pub fn artifact_exists(base: &Path) -> bool {
    artifact_file(base).is_file()
}

/// Encode `collection`, compress it at `level` and atomically place it at the
/// artifact path for `base`. Returns the collection.
pub fn write_artifact(
    collection: Dataset,
    member_name: &str,
    base: &Path,
    level: i32,
) -> Result<Dataset> {
    let path = artifact_file(base);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(CacheConfig::TEMP_PREFIX)
        .suffix(CacheConfig::TEMP_SUFFIX)
        .tempfile_in(&dir)
        .map_err(|e| ZeitError::Io {
            message: format!("Failed to create temp file in {}", dir.display()),
            path: Some(dir.clone()),
            source: Some(e),
        })?;
    let temp_path = temp.path().to_path_buf();

    let temp = compress_into(&collection, temp, level).map_err(|e| e.at_path(&temp_path))?;

    temp.as_file().sync_all().map_err(|e| ZeitError::Io {
        message: format!("Failed to sync temp file {}", temp_path.display()),
        path: Some(temp_path.clone()),
        source: Some(e),
    })?;

    temp.persist(&path).map_err(|e| ZeitError::Io {
        message: format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        ),
        path: Some(path.clone()),
        source: Some(e.error),
    })?;

    if member_name.is_empty() {
        debug!("Atomically wrote {}", path.display());
    } else {
        debug!("Atomically wrote {} ({})", path.display(), member_name);
    }
    Ok(collection)
}

fn compress_into(collection: &Dataset, temp: NamedTempFile, level: i32) -> Result<NamedTempFile> {
    let mut encoder = zstd::stream::Encoder::new(BufWriter::new(temp), level)?;
    container::encode(collection, &mut encoder)?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Read and restore the artifact for `base`.
///
/// Arrays written as promoted collections come back as arrays.
pub fn read_artifact(base: &Path) -> Result<Data> {
    let path = artifact_file(base);
    let file = File::open(&path).map_err(|e| ZeitError::Io {
        message: format!("Failed to open {}", path.display()),
        path: Some(path.clone()),
        source: Some(e),
    })?;

    let mut decoder = zstd::stream::Decoder::new(file)
        .map_err(|e| ZeitError::io_with_path(e, &path))?;
    let collection = container::decode(&mut decoder).map_err(|e| e.at_path(&path))?;
    debug!("Read {}", path.display());

    restore_from_storage(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataArray, Variable};
    use crate::resolve::classify_and_normalize;
    use tempfile::TempDir;

    fn weather() -> Dataset {
        Dataset::new()
            .with_coord("time", Variable::new(["time"], vec![0i64, 1, 2]).unwrap())
            .unwrap()
            .with_var("temp", Variable::new(["time"], vec![280.0f64, 281.5, 279.0]).unwrap())
            .unwrap()
            .with_attr("source", "station-7")
    }

    #[test]
    fn test_artifact_file_appends_suffix() {
        let file = artifact_file(Path::new("/c/spam_ab.ztc"));
        assert_eq!(file, PathBuf::from("/c/spam_ab.ztc.zstd"));
    }

    #[test]
    fn test_write_then_read_collection() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("weather_00.ztc");

        assert!(!artifact_exists(&base));
        let returned = write_artifact(weather(), "", &base, 3).unwrap();
        assert_eq!(returned, weather());
        assert!(artifact_exists(&base));

        let read = read_artifact(&base).unwrap();
        assert_eq!(read, Data::Dataset(weather()));
    }

    #[test]
    fn test_promoted_array_reads_back_as_array() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("spam_00.ztc");
        let arr = DataArray::new(["x"], vec![1.0f64, 2.0, 3.0])
            .unwrap()
            .with_name("spam")
            .with_attr("units", "m");

        let mut normalized = classify_and_normalize(arr.clone().into()).unwrap();
        normalized.stamp_provenance();
        write_artifact(normalized.collection, &normalized.member, &base, 3).unwrap();

        assert_eq!(read_artifact(&base).unwrap(), Data::Array(arr));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("weather_00.ztc");
        write_artifact(weather(), "", &base, 3).unwrap();

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["weather_00.ztc.zstd".to_string()]);
    }

    #[test]
    fn test_readable_without_the_library_reader() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("weather_00.ztc");
        write_artifact(weather(), "", &base, 19).unwrap();

        let raw = std::fs::read(artifact_file(&base)).unwrap();
        let plain = zstd::decode_all(raw.as_slice()).unwrap();
        assert_eq!(&plain[..4], container::MAGIC);
        assert_eq!(container::decode(&mut plain.as_slice()).unwrap(), weather());
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_artifact(&temp_dir.path().join("absent.ztc")).unwrap_err();
        match err {
            ZeitError::Io { path, .. } => {
                assert!(path.unwrap().ends_with("absent.ztc.zstd"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_garbage_artifact_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("junk.ztc");
        std::fs::write(artifact_file(&base), b"not zstd at all").unwrap();
        assert!(matches!(read_artifact(&base), Err(ZeitError::Io { .. })));
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("nope").join("weather_00.ztc");
        let err = write_artifact(weather(), "", &base, 3).unwrap_err();
        assert!(matches!(err, ZeitError::Io { .. }));
    }
}
