//! Element types and typed array storage.

use crate::error::{Result, ZeitError};
use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float64,
    Float32,
    Int64,
    Int32,
    UInt8,
    Bool,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::Int64 => "int64",
            DType::Int32 => "int32",
            DType::UInt8 => "uint8",
            DType::Bool => "bool",
        }
    }

    /// Size of one element in the little-endian storage encoding.
    pub fn item_size(&self) -> usize {
        match self {
            DType::Float64 | DType::Int64 => 8,
            DType::Float32 | DType::Int32 => 4,
            DType::UInt8 | DType::Bool => 1,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-width element with a little-endian byte encoding.
trait Element: Copy + fmt::Display {
    const SIZE: usize;
    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
    fn as_f64(self) -> f64;
}

macro_rules! numeric_element {
    ($($ty:ty),*) => {$(
        impl Element for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn as_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

numeric_element!(f64, f32, i64, i32, u8);

impl Element for bool {
    const SIZE: usize = 1;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn as_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

/// Typed n-dimensional storage backing a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Float64(ArrayD<f64>),
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
    Int32(ArrayD<i32>),
    UInt8(ArrayD<u8>),
    Bool(ArrayD<bool>),
}

/// Runs `$body` with `$arr` bound to the inner array of any variant.
macro_rules! with_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ArrayData::Float64($arr) => $body,
            ArrayData::Float32($arr) => $body,
            ArrayData::Int64($arr) => $body,
            ArrayData::Int32($arr) => $body,
            ArrayData::UInt8($arr) => $body,
            ArrayData::Bool($arr) => $body,
        }
    };
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Float64(_) => DType::Float64,
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::UInt8(_) => DType::UInt8,
            ArrayData::Bool(_) => DType::Bool,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, arr => arr.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_array!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes the storage encoding occupies.
    pub fn byte_len(&self) -> usize {
        self.len() * self.dtype().item_size()
    }

    /// Converts every element to `f64`; booleans become 0.0 / 1.0.
    pub fn to_f64(&self) -> ArrayD<f64> {
        with_array!(self, arr => arr.mapv(Element::as_f64))
    }

    /// Encodes the elements in logical (row-major) order, little-endian.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        with_array!(self, arr => {
            for value in arr.iter() {
                value.write_le(&mut out);
            }
        });
        out
    }

    /// Decodes a buffer produced by [`ArrayData::to_le_bytes`].
    pub fn from_le_bytes(dtype: DType, shape: &[usize], bytes: &[u8]) -> Result<Self> {
        let data = match dtype {
            DType::Float64 => ArrayData::Float64(decode(shape, bytes)?),
            DType::Float32 => ArrayData::Float32(decode(shape, bytes)?),
            DType::Int64 => ArrayData::Int64(decode(shape, bytes)?),
            DType::Int32 => ArrayData::Int32(decode(shape, bytes)?),
            DType::UInt8 => ArrayData::UInt8(decode(shape, bytes)?),
            DType::Bool => ArrayData::Bool(decode(shape, bytes)?),
        };
        Ok(data)
    }
}

fn decode<T: Element>(shape: &[usize], bytes: &[u8]) -> Result<ArrayD<T>> {
    let count: usize = shape.iter().product();
    if bytes.len() != count * T::SIZE {
        return Err(ZeitError::validation(
            "data",
            format!(
                "expected {} bytes for shape {:?}, got {}",
                count * T::SIZE,
                shape,
                bytes.len()
            ),
        ));
    }
    let values: Vec<T> = bytes.chunks_exact(T::SIZE).map(T::read_le).collect();
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|e| ZeitError::validation("data", e.to_string()))
}

impl fmt::Display for ArrayData {
    /// Lists every element in logical order, e.g. `[1, 2, 3]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        with_array!(self, arr => {
            for (i, value) in arr.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
        });
        f.write_str("]")
    }
}

macro_rules! from_array {
    ($($ty:ty => $variant:ident),*) => {$(
        impl From<ArrayD<$ty>> for ArrayData {
            fn from(arr: ArrayD<$ty>) -> Self {
                ArrayData::$variant(arr)
            }
        }

        impl From<Vec<$ty>> for ArrayData {
            fn from(values: Vec<$ty>) -> Self {
                ArrayData::$variant(Array1::from(values).into_dyn())
            }
        }
    )*};
}

from_array!(f64 => Float64, f32 => Float32, i64 => Int64, i32 => Int32, u8 => UInt8, bool => Bool);
