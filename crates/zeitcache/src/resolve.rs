//! Classification of cacheable values.
//!
//! Storage always holds a collection. A single array is wrapped as a
//! one-member collection under its own name, and the stored collection is
//! stamped with a provenance marker so reads can unwrap it again.

use crate::config::CacheConfig;
use crate::dataset::{AttrValue, Data, Dataset};
use crate::error::{Result, ZeitError};
use std::any::{type_name, Any};
use tracing::debug;

/// Which of the two cacheable shapes a value has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Single,
    Collection,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Single => "DataArray",
            Kind::Collection => "Dataset",
        }
    }
}

/// A value in its storage form.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub kind: Kind,
    /// Name of the wrapped array; empty for native collections.
    pub member: String,
    pub collection: Dataset,
}

impl Normalized {
    /// Mark a promoted array so the stored collection can be unwrapped.
    /// Native collections are left alone.
    pub fn stamp_provenance(&mut self) {
        if self.kind == Kind::Single {
            self.collection.attrs_mut().insert(
                CacheConfig::PROVENANCE_ATTR.to_string(),
                AttrValue::from(CacheConfig::PROVENANCE_SINGLE),
            );
        }
    }

    /// Back to the shape the value had before normalization.
    pub fn restore(self) -> Result<Data> {
        restore_from_storage(self.collection)
    }
}

/// Validate `data` and convert it to its storage form.
///
/// Collections may not carry the provenance attribute themselves; it would
/// be indistinguishable from the marker on read.
pub fn classify_and_normalize(data: Data) -> Result<Normalized> {
    match data {
        Data::Array(arr) => {
            let name = match arr.name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    return Err(ZeitError::validation(
                        "name",
                        "Resulting DataArray has no name, can't serialize cleanly",
                    ))
                }
            };
            debug!("Data passed in is a DataArray named {}", name);
            let collection = arr.to_dataset(name.clone())?;
            Ok(Normalized {
                kind: Kind::Single,
                member: name,
                collection,
            })
        }
        Data::Dataset(ds) => {
            if ds.is_empty() {
                return Err(ZeitError::validation(
                    "data_vars",
                    "Dataset has no data variables to cache",
                ));
            }
            if ds.attrs().contains_key(CacheConfig::PROVENANCE_ATTR) {
                return Err(ZeitError::validation(
                    CacheConfig::PROVENANCE_ATTR,
                    format!(
                        "Dataset attribute {} is reserved for cache bookkeeping",
                        CacheConfig::PROVENANCE_ATTR
                    ),
                ));
            }
            debug!("Data passed in is a Dataset with {} variables", ds.len());
            Ok(Normalized {
                kind: Kind::Collection,
                member: String::new(),
                collection: ds,
            })
        }
    }
}

/// Accept an arbitrary value if it is one of the cacheable shapes.
///
/// The entry points in [`crate::api`] take `impl Into<Data>`, so other types
/// are already rejected at compile time there. This is for callers holding
/// values whose type is only known at run time, such as `Box<dyn Any>`
/// payloads from a plugin or scripting layer.
pub fn classify_value<T: Any>(value: T) -> Result<Data> {
    let boxed: Box<dyn Any> = Box::new(value);
    let boxed = match boxed.downcast::<Data>() {
        Ok(data) => return Ok(*data),
        Err(other) => other,
    };
    let boxed = match boxed.downcast::<crate::dataset::DataArray>() {
        Ok(arr) => return Ok(Data::Array(*arr)),
        Err(other) => other,
    };
    match boxed.downcast::<Dataset>() {
        Ok(ds) => Ok(Data::Dataset(*ds)),
        Err(_) => Err(ZeitError::UnsupportedType {
            type_name: type_name::<T>().to_string(),
        }),
    }
}

/// Undo normalization on a collection read from storage.
///
/// A collection marked as a promoted array must hold exactly one member,
/// which is returned bare with the marker removed. Unmarked collections are
/// returned as they are.
pub fn restore_from_storage(mut collection: Dataset) -> Result<Data> {
    let marker = collection.attrs_mut().remove(CacheConfig::PROVENANCE_ATTR);
    match marker {
        None => Ok(Data::Dataset(collection)),
        Some(AttrValue::Text(kind)) if kind == CacheConfig::PROVENANCE_SINGLE => {
            if collection.len() != 1 {
                return Err(ZeitError::validation(
                    CacheConfig::PROVENANCE_ATTR,
                    format!(
                        "expected a single-variable collection for a cached DataArray, found {}",
                        collection.len()
                    ),
                ));
            }
            let name = collection
                .names()
                .next()
                .map(str::to_string)
                .unwrap_or_default();
            let arr = collection.into_array(&name).ok_or_else(|| {
                ZeitError::validation(CacheConfig::PROVENANCE_ATTR, "missing member")
            })?;
            debug!("DataArray restored with variable {}", name);
            Ok(Data::Array(arr))
        }
        Some(other) => Err(ZeitError::validation(
            CacheConfig::PROVENANCE_ATTR,
            format!("unrecognized provenance marker {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataArray, Variable};

    fn named() -> DataArray {
        DataArray::new(["x"], vec![1i64, 2, 3])
            .unwrap()
            .with_name("spam")
            .with_coord("x", Variable::new(["x"], vec![10i64, 20, 30]).unwrap())
            .unwrap()
    }

    #[test]
    fn test_single_array_is_wrapped() {
        let normalized = classify_and_normalize(named().into()).unwrap();
        assert_eq!(normalized.kind, Kind::Single);
        assert_eq!(normalized.member, "spam");
        assert_eq!(normalized.collection.len(), 1);
        assert!(normalized.collection.data_vars().contains_key("spam"));
        assert!(normalized.collection.attrs().is_empty());
    }

    #[test]
    fn test_unnamed_array_rejected() {
        let arr = DataArray::new(["x"], vec![1i64]).unwrap();
        let err = classify_and_normalize(arr.into()).unwrap_err();
        assert!(matches!(err, ZeitError::Validation { ref field, .. } if field == "name"));

        let empty_name = DataArray::new(["x"], vec![1i64]).unwrap().with_name("");
        assert!(classify_and_normalize(empty_name.into()).is_err());
    }

    #[test]
    fn test_empty_collection_rejected() {
        let err = classify_and_normalize(Dataset::new().into()).unwrap_err();
        assert!(matches!(err, ZeitError::Validation { ref field, .. } if field == "data_vars"));
    }

    #[test]
    fn test_collection_with_reserved_attr_rejected() {
        for marker in ["Series", "DataArray"] {
            let ds = Dataset::new()
                .with_var("a", Variable::new(["t"], vec![1.0f64]).unwrap())
                .unwrap()
                .with_attr(CacheConfig::PROVENANCE_ATTR, marker);
            let err = classify_and_normalize(ds.into()).unwrap_err();
            assert!(matches!(
                err,
                ZeitError::Validation { ref field, .. } if field == CacheConfig::PROVENANCE_ATTR
            ));
        }
    }

    #[test]
    fn test_collection_passes_through() {
        let ds = Dataset::new()
            .with_var("a", Variable::new(["t"], vec![1.0f64]).unwrap())
            .unwrap();
        let normalized = classify_and_normalize(ds.clone().into()).unwrap();
        assert_eq!(normalized.kind, Kind::Collection);
        assert_eq!(normalized.collection, ds);
    }

    #[test]
    fn test_stamp_and_restore_single() {
        let mut normalized = classify_and_normalize(named().into()).unwrap();
        normalized.stamp_provenance();
        assert_eq!(
            normalized
                .collection
                .attrs()
                .get(CacheConfig::PROVENANCE_ATTR),
            Some(&AttrValue::from("DataArray"))
        );

        let restored = normalized.restore().unwrap();
        assert_eq!(restored, Data::Array(named()));
    }

    #[test]
    fn test_stamp_skips_collections() {
        let ds = Dataset::new()
            .with_var("a", Variable::new(["t"], vec![1.0f64]).unwrap())
            .unwrap();
        let mut normalized = classify_and_normalize(ds.into()).unwrap();
        normalized.stamp_provenance();
        assert!(normalized.collection.attrs().is_empty());
        assert!(matches!(normalized.restore().unwrap(), Data::Dataset(_)));
    }

    #[test]
    fn test_marker_with_two_members_rejected() {
        let ds = Dataset::new()
            .with_var("a", Variable::new(["t"], vec![1.0f64]).unwrap())
            .unwrap()
            .with_var("b", Variable::new(["t"], vec![2.0f64]).unwrap())
            .unwrap()
            .with_attr(CacheConfig::PROVENANCE_ATTR, "DataArray");
        assert!(matches!(
            restore_from_storage(ds),
            Err(ZeitError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_marker_rejected() {
        let ds = Dataset::new()
            .with_var("a", Variable::new(["t"], vec![1.0f64]).unwrap())
            .unwrap()
            .with_attr(CacheConfig::PROVENANCE_ATTR, "Series");
        assert!(restore_from_storage(ds).is_err());
    }

    #[test]
    fn test_classify_value() {
        assert!(matches!(classify_value(named()), Ok(Data::Array(_))));
        assert!(matches!(classify_value(Dataset::new()), Ok(Data::Dataset(_))));
        assert!(matches!(
            classify_value(Data::from(named())),
            Ok(Data::Array(_))
        ));

        let err = classify_value(vec![1, 2, 3]).unwrap_err();
        match err {
            ZeitError::UnsupportedType { type_name } => assert!(type_name.contains("Vec")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
