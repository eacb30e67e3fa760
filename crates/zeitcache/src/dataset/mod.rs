//! Labeled multi-dimensional array model.
//!
//! A small xarray-style data model built on `ndarray`: variables carry named
//! dimensions and attributes, arrays add a name and coordinates, and
//! collections hold several arrays sharing one coordinate system.

mod array;
mod attrs;
mod collection;
mod data;
mod dtype;
mod variable;

pub use array::DataArray;
pub use attrs::{AttrValue, Attrs, Kwargs};
pub(crate) use attrs::fmt_mapping;
pub use collection::{Coords, Dataset};
pub use data::Data;
pub use dtype::{ArrayData, DType};
pub use variable::Variable;
