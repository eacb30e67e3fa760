//! Single named, labeled array.

use super::attrs::{AttrValue, Attrs};
use super::collection::{Coords, Dataset};
use super::dtype::{ArrayData, DType};
use super::variable::Variable;
use crate::error::{Result, ZeitError};
use ndarray::Axis;

/// A single labeled array: an optional name, one variable, and the
/// coordinate variables that label its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    name: Option<String>,
    variable: Variable,
    coords: Coords,
}

impl DataArray {
    /// Create an unnamed array.
    pub fn new<D, S>(dims: D, data: impl Into<ArrayData>) -> Result<Self>
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::from_variable(Variable::new(dims, data)?))
    }

    pub fn from_variable(variable: Variable) -> Self {
        Self {
            name: None,
            variable,
            coords: Coords::new(),
        }
    }

    pub(crate) fn from_parts(name: Option<String>, variable: Variable, coords: Coords) -> Self {
        Self {
            name,
            variable,
            coords,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Attach a coordinate. Its dimensions must belong to this array and
    /// agree in size.
    pub fn with_coord(mut self, name: impl Into<String>, coord: Variable) -> Result<Self> {
        let name = name.into();
        for (dim, size) in coord.sizes() {
            match self.variable.dim_size(dim) {
                Some(expected) if expected == size => {}
                Some(expected) => {
                    return Err(ZeitError::validation(
                        "coords",
                        format!(
                            "coordinate {} has size {} along {}, array has {}",
                            name, size, dim, expected
                        ),
                    ))
                }
                None => {
                    return Err(ZeitError::validation(
                        "coords",
                        format!("coordinate {} uses dimension {} not on the array", name, dim),
                    ))
                }
            }
        }
        self.coords.insert(name, coord);
        Ok(self)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.variable.attrs_mut().insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dims(&self) -> &[String] {
        self.variable.dims()
    }

    pub fn shape(&self) -> &[usize] {
        self.variable.shape()
    }

    pub fn dtype(&self) -> DType {
        self.variable.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        self.variable.data()
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn attrs(&self) -> &Attrs {
        self.variable.attrs()
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        self.variable.attrs_mut()
    }

    /// Arithmetic mean along `dim`.
    ///
    /// The result is float64, keeps the name, drops attributes and any
    /// coordinate on `dim`. An empty axis yields NaN.
    pub fn mean(&self, dim: &str) -> Result<DataArray> {
        let axis = self
            .dims()
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| {
                ZeitError::validation("dim", format!("{} is not a dimension of the array", dim))
            })?;

        let values = self.data().to_f64();
        let count = values.len_of(Axis(axis)) as f64;
        let reduced = values.sum_axis(Axis(axis)).mapv(|sum| sum / count);

        let dims: Vec<String> = self
            .dims()
            .iter()
            .filter(|d| d.as_str() != dim)
            .cloned()
            .collect();
        let variable = Variable::new(dims, reduced)?;

        let coords = self
            .coords
            .iter()
            .filter(|(_, c)| !c.dims().iter().any(|d| d == dim))
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect();

        Ok(DataArray::from_parts(self.name.clone(), variable, coords))
    }

    /// The value of a single-element array as `f64`.
    pub fn item(&self) -> Result<f64> {
        let values = self.data().to_f64();
        if values.len() != 1 {
            return Err(ZeitError::validation(
                "data",
                format!("item() needs exactly one element, array has {}", values.len()),
            ));
        }
        values
            .iter()
            .next()
            .copied()
            .ok_or_else(|| ZeitError::validation("data", "array is empty"))
    }

    /// Wrap this array as the only member of a collection under `name`.
    ///
    /// Coordinates move to the collection; attributes stay on the member.
    pub fn to_dataset(self, name: impl Into<String>) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        for (coord_name, coord) in self.coords {
            dataset.insert_coord(coord_name, coord)?;
        }
        dataset.insert_var(name, self.variable)?;
        Ok(dataset)
    }
}
