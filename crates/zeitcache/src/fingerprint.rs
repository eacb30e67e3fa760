//! Metadata fingerprints used in cache keys.
//!
//! The default policy hashes only what describes a dataset (name, shape,
//! dtype, coordinates, attributes), which is cheap regardless of array size.
//! Two inputs that differ only in their bulk values share a fingerprint under
//! that policy; [`FingerprintPolicy::Content`] also hashes the values.

use crate::dataset::{fmt_mapping, Data};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// What goes into a fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintPolicy {
    /// Name, shape, dtype, coordinates and attributes.
    #[default]
    Metadata,
    /// Metadata plus the little-endian bytes of every data variable.
    Content,
}

/// SHA-256 digest as 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of `data`.
///
/// Fed in order, newline-terminated: name, shape, dtype, coordinates,
/// attributes.
pub fn fingerprint(data: &Data, policy: FingerprintPolicy) -> Fingerprint {
    let mut hasher = Sha256::new();

    for part in [
        name_text(data),
        shape_text(data),
        dtype_text(data),
        fmt_mapping(data.coords()),
        fmt_mapping(data.attrs()),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(b"\n");
    }

    if policy == FingerprintPolicy::Content {
        match data {
            Data::Array(arr) => hasher.update(arr.data().to_le_bytes()),
            Data::Dataset(ds) => {
                for (name, var) in ds.data_vars() {
                    hasher.update(name.as_bytes());
                    hasher.update(var.data().to_le_bytes());
                }
            }
        }
    }

    Fingerprint(hex::encode(hasher.finalize()))
}

fn name_text(data: &Data) -> String {
    data.name().unwrap_or("None").to_string()
}

fn shape_text(data: &Data) -> String {
    match data {
        Data::Array(arr) => format!("{:?}", arr.shape()),
        Data::Dataset(ds) => fmt_mapping(&ds.sizes()),
    }
}

fn dtype_text(data: &Data) -> String {
    match data {
        Data::Array(arr) => arr.dtype().to_string(),
        Data::Dataset(ds) => {
            let dtypes: BTreeMap<String, &'static str> = ds
                .data_vars()
                .iter()
                .map(|(name, var)| (name.clone(), var.dtype().as_str()))
                .collect();
            fmt_mapping(&dtypes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataArray, Dataset, Variable};

    fn spam(values: Vec<i64>) -> Data {
        DataArray::new(["x"], values)
            .unwrap()
            .with_name("spam")
            .into()
    }

    #[test]
    fn test_fixed_length_hex() {
        let fp = fingerprint(&spam(vec![1, 2, 3]), FingerprintPolicy::Metadata);
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_metadata_ignores_values() {
        let a = fingerprint(&spam(vec![1, 2, 3]), FingerprintPolicy::Metadata);
        let b = fingerprint(&spam(vec![7, 8, 9]), FingerprintPolicy::Metadata);
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_sees_values() {
        let a = fingerprint(&spam(vec![1, 2, 3]), FingerprintPolicy::Content);
        let b = fingerprint(&spam(vec![7, 8, 9]), FingerprintPolicy::Content);
        let c = fingerprint(&spam(vec![1, 2, 3]), FingerprintPolicy::Content);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_metadata_changes_fingerprint() {
        let base = fingerprint(&spam(vec![1, 2, 3]), FingerprintPolicy::Metadata);

        let renamed: Data = DataArray::new(["x"], vec![1i64, 2, 3])
            .unwrap()
            .with_name("eggs")
            .into();
        let longer = spam(vec![1, 2, 3, 4]);
        let float: Data = DataArray::new(["x"], vec![1.0f64, 2.0, 3.0])
            .unwrap()
            .with_name("spam")
            .into();
        let with_attr: Data = DataArray::new(["x"], vec![1i64, 2, 3])
            .unwrap()
            .with_name("spam")
            .with_attr("units", "m")
            .into();
        let with_coord: Data = DataArray::new(["x"], vec![1i64, 2, 3])
            .unwrap()
            .with_name("spam")
            .with_coord("x", Variable::new(["x"], vec![0i64, 1, 2]).unwrap())
            .unwrap()
            .into();

        for other in [renamed, longer, float, with_attr, with_coord] {
            assert_ne!(base, fingerprint(&other, FingerprintPolicy::Metadata));
        }
    }

    #[test]
    fn test_dataset_fingerprint_is_stable() {
        let ds = || -> Data {
            Dataset::new()
                .with_var("a", Variable::new(["t"], vec![1.0f64, 2.0]).unwrap())
                .unwrap()
                .with_attr("title", "run 1")
                .into()
        };
        assert_eq!(
            fingerprint(&ds(), FingerprintPolicy::Metadata),
            fingerprint(&ds(), FingerprintPolicy::Metadata)
        );
    }

    #[test]
    fn test_known_digest_input() {
        // Unnamed 0-d float with nothing attached.
        let data: Data = DataArray::from_variable(
            Variable::new(Vec::<String>::new(), ndarray::arr0(1.0f64).into_dyn()).unwrap(),
        )
        .into();
        let expected = hex::encode(Sha256::digest(b"None\n[]\nfloat64\n{}\n{}\n"));
        assert_eq!(
            fingerprint(&data, FingerprintPolicy::Metadata).as_str(),
            expected
        );
    }
}
