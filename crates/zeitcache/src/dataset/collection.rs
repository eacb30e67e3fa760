//! Multi-variable collection sharing coordinates.

use super::array::DataArray;
use super::attrs::{AttrValue, Attrs};
use super::variable::Variable;
use crate::error::{Result, ZeitError};
use std::collections::BTreeMap;

/// Coordinate variables keyed by name.
pub type Coords = BTreeMap<String, Variable>;

/// Named data variables sharing one coordinate system.
///
/// Every dimension has a single size across all data variables and
/// coordinates; inserts that disagree are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    data_vars: BTreeMap<String, Variable>,
    coords: Coords,
    attrs: Attrs,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, var: Variable) -> Result<Self> {
        self.insert_var(name, var)?;
        Ok(self)
    }

    pub fn with_coord(mut self, name: impl Into<String>, coord: Variable) -> Result<Self> {
        self.insert_coord(name, coord)?;
        Ok(self)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Add or replace a data variable.
    pub fn insert_var(&mut self, name: impl Into<String>, var: Variable) -> Result<()> {
        let name = name.into();
        self.check_sizes(&name, &var)?;
        self.data_vars.insert(name, var);
        Ok(())
    }

    /// Add or replace a coordinate variable.
    pub fn insert_coord(&mut self, name: impl Into<String>, coord: Variable) -> Result<()> {
        let name = name.into();
        self.check_sizes(&name, &coord)?;
        self.coords.insert(name, coord);
        Ok(())
    }

    fn check_sizes(&self, name: &str, var: &Variable) -> Result<()> {
        let sizes = self.sizes();
        for (dim, size) in var.sizes() {
            if let Some(&existing) = sizes.get(dim) {
                if existing != size {
                    return Err(ZeitError::validation(
                        "dims",
                        format!(
                            "{} has size {} along {}, collection has {}",
                            name, size, dim, existing
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn data_vars(&self) -> &BTreeMap<String, Variable> {
        &self.data_vars
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Number of data variables.
    pub fn len(&self) -> usize {
        self.data_vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data_vars.keys().map(String::as_str)
    }

    /// Size of every dimension used by a data variable or coordinate.
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for var in self.coords.values().chain(self.data_vars.values()) {
            for (dim, size) in var.sizes() {
                sizes.entry(dim.to_string()).or_insert(size);
            }
        }
        sizes
    }

    /// View one data variable as an array, with the coordinates that fit it.
    pub fn get(&self, name: &str) -> Option<DataArray> {
        let var = self.data_vars.get(name)?;
        let coords = self
            .coords
            .iter()
            .filter(|(_, c)| c.spans_subset_of(var.dims()))
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect();
        Some(DataArray::from_parts(
            Some(name.to_string()),
            var.clone(),
            coords,
        ))
    }

    /// Consume the collection, extracting one data variable as an array.
    pub fn into_array(mut self, name: &str) -> Option<DataArray> {
        let var = self.data_vars.remove(name)?;
        let coords = self
            .coords
            .into_iter()
            .filter(|(_, c)| c.spans_subset_of(var.dims()))
            .collect();
        Some(DataArray::from_parts(Some(name.to_string()), var, coords))
    }

    /// Flatten one-dimensional variables into rows of `f64`.
    ///
    /// All data variables must be 1-D over the same dimension; a coordinate
    /// on that dimension becomes the leading column.
    pub fn to_rows(&self) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
        let mut dim: Option<&str> = None;
        for (name, var) in &self.data_vars {
            match (var.dims(), dim) {
                ([only], None) => dim = Some(only.as_str()),
                ([only], Some(d)) if only == d => {}
                _ => {
                    return Err(ZeitError::validation(
                        "data_vars",
                        format!("{} is not one-dimensional over a shared dimension", name),
                    ))
                }
            }
        }
        let Some(dim) = dim else {
            return Ok((Vec::new(), Vec::new()));
        };

        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
        if let Some(index) = self.coords.get(dim).filter(|c| c.dims().len() == 1) {
            columns.push((dim.to_string(), index.data().to_f64().iter().copied().collect()));
        }
        for (name, var) in &self.data_vars {
            columns.push((name.clone(), var.data().to_f64().iter().copied().collect()));
        }

        let rows_len = self.sizes().get(dim).copied().unwrap_or(0);
        let rows = (0..rows_len)
            .map(|i| columns.iter().map(|(_, values)| values[i]).collect())
            .collect();
        let header = columns.into_iter().map(|(name, _)| name).collect();
        Ok((header, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> Dataset {
        Dataset::new()
            .with_coord("time", Variable::new(["time"], vec![0i64, 1, 2]).unwrap())
            .unwrap()
            .with_var("temp", Variable::new(["time"], vec![280.0f64, 281.5, 279.0]).unwrap())
            .unwrap()
            .with_var("rain", Variable::new(["time"], vec![0.0f32, 1.5, 0.0]).unwrap())
            .unwrap()
            .with_attr("source", "station-7")
    }

    #[test]
    fn test_sizes_and_names() {
        let ds = weather();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.sizes().get("time"), Some(&3));
        assert_eq!(ds.names().collect::<Vec<_>>(), vec!["rain", "temp"]);
    }

    #[test]
    fn test_conflicting_sizes_rejected() {
        let bad = Variable::new(["time"], vec![1.0f64, 2.0]).unwrap();
        let err = weather().with_var("short", bad).unwrap_err();
        assert!(matches!(err, ZeitError::Validation { .. }));
    }

    #[test]
    fn test_get_attaches_matching_coords() {
        let temp = weather().get("temp").unwrap();
        assert_eq!(temp.name(), Some("temp"));
        assert!(temp.coords().contains_key("time"));
        assert!(weather().get("missing").is_none());
    }

    #[test]
    fn test_into_array() {
        let rain = weather().into_array("rain").unwrap();
        assert_eq!(rain.shape(), &[3]);
        assert_eq!(rain.coords().len(), 1);
    }

    #[test]
    fn test_to_rows() {
        let (header, rows) = weather().to_rows().unwrap();
        assert_eq!(header, vec!["time", "rain", "temp"]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec![1.0, 1.5, 281.5]);
    }

    #[test]
    fn test_to_rows_rejects_mixed_dims() {
        let ds = weather()
            .with_var("other", Variable::new(["x"], vec![1i32]).unwrap())
            .unwrap();
        assert!(ds.to_rows().is_err());
    }

    #[test]
    fn test_empty() {
        let ds = Dataset::new();
        assert!(ds.is_empty());
        assert_eq!(ds.to_rows().unwrap().1.len(), 0);
    }
}
