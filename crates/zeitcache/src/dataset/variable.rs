//! A dimensioned array with attributes.

use super::attrs::{fmt_mapping, AttrValue, Attrs};
use super::dtype::{ArrayData, DType};
use crate::error::{Result, ZeitError};
use std::fmt;

/// Named dimensions, typed data and attributes; the building block of both
/// arrays and collections.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: ArrayData,
    attrs: Attrs,
}

impl Variable {
    /// Create a variable, checking that every axis of `data` has exactly one
    /// distinct dimension name.
    pub fn new<D, S>(dims: D, data: impl Into<ArrayData>) -> Result<Self>
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        let data = data.into();

        if dims.len() != data.ndim() {
            return Err(ZeitError::validation(
                "dims",
                format!(
                    "{} dimension names given for an array of rank {}",
                    dims.len(),
                    data.ndim()
                ),
            ));
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(ZeitError::validation(
                    "dims",
                    format!("dimension {} appears more than once", dim),
                ));
            }
        }

        Ok(Self {
            dims,
            data,
            attrs: Attrs::new(),
        })
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Size of a named dimension, if this variable has it.
    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .map(|axis| self.shape()[axis])
    }

    /// `(dimension, size)` pairs in axis order.
    pub fn sizes(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.dims
            .iter()
            .map(String::as_str)
            .zip(self.shape().iter().copied())
    }

    /// Returns true when every dimension of this variable is one of `dims`.
    pub fn spans_subset_of(&self, dims: &[String]) -> bool {
        self.dims.iter().all(|d| dims.contains(d))
    }
}

impl fmt::Display for Variable {
    /// `(x) int64 [10, 20, 30]`, followed by attributes when present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} {}", self.dims.join(", "), self.dtype(), self.data)?;
        if !self.attrs.is_empty() {
            write!(f, " {}", fmt_mapping(&self.attrs))?;
        }
        Ok(())
    }
}
