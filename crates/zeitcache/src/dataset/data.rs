//! The cacheable value: a single array or a collection.

use super::array::DataArray;
use super::attrs::Attrs;
use super::collection::{Coords, Dataset};

/// Input to and output of a cached computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Array(DataArray),
    Dataset(Dataset),
}

impl Data {
    pub fn as_array(&self) -> Option<&DataArray> {
        match self {
            Data::Array(arr) => Some(arr),
            Data::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Data::Dataset(ds) => Some(ds),
            Data::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<DataArray> {
        match self {
            Data::Array(arr) => Some(arr),
            Data::Dataset(_) => None,
        }
    }

    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            Data::Dataset(ds) => Some(ds),
            Data::Array(_) => None,
        }
    }

    /// Array name; collections are unnamed.
    pub fn name(&self) -> Option<&str> {
        match self {
            Data::Array(arr) => arr.name(),
            Data::Dataset(_) => None,
        }
    }

    pub fn coords(&self) -> &Coords {
        match self {
            Data::Array(arr) => arr.coords(),
            Data::Dataset(ds) => ds.coords(),
        }
    }

    pub fn attrs(&self) -> &Attrs {
        match self {
            Data::Array(arr) => arr.attrs(),
            Data::Dataset(ds) => ds.attrs(),
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_label(&self) -> &'static str {
        match self {
            Data::Array(_) => "DataArray",
            Data::Dataset(_) => "Dataset",
        }
    }
}

impl From<DataArray> for Data {
    fn from(arr: DataArray) -> Self {
        Data::Array(arr)
    }
}

impl From<Dataset> for Data {
    fn from(ds: Dataset) -> Self {
        Data::Dataset(ds)
    }
}
