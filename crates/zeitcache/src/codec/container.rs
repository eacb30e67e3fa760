//! Self-describing binary container for collections.
//!
//! ```text
//! magic   "ZTCF"
//! version u32 LE
//! hlen    u64 LE
//! header  hlen bytes of JSON
//! data    little-endian buffers, coords then data_vars, in name order
//! ```
//!
//! Buffer offsets in the header are relative to the start of the data
//! section.

use crate::dataset::{ArrayData, AttrValue, Attrs, DType, Dataset, Variable};
use crate::error::{Result, ZeitError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use tracing::debug;

pub const MAGIC: &[u8; 4] = b"ZTCF";
pub const VERSION: u32 = 1;

/// Upper bound on the JSON header, guarding allocation on corrupt input.
const MAX_HEADER_LEN: u64 = 64 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct ContainerHeader {
    #[serde(default)]
    attrs: Attrs,
    #[serde(default)]
    coords: BTreeMap<String, VariableHeader>,
    #[serde(default)]
    data_vars: BTreeMap<String, VariableHeader>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VariableHeader {
    dims: Vec<String>,
    shape: Vec<usize>,
    dtype: DType,
    #[serde(default)]
    attrs: Attrs,
    offset: u64,
    length: u64,
}

/// Write `dataset` to `writer`, returning the number of bytes written.
pub fn encode<W: Write>(dataset: &Dataset, writer: &mut W) -> Result<u64> {
    check_attrs("attrs", dataset.attrs())?;

    let mut offset = 0u64;
    let mut buffers = Vec::new();
    let coords = describe(dataset.coords(), &mut offset, &mut buffers)?;
    let data_vars = describe(dataset.data_vars(), &mut offset, &mut buffers)?;

    let header = ContainerHeader {
        attrs: dataset.attrs().clone(),
        coords,
        data_vars,
    };
    let header = serde_json::to_vec(&header)?;

    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(header.len() as u64).to_le_bytes())?;
    writer.write_all(&header)?;
    for buffer in &buffers {
        writer.write_all(buffer)?;
    }

    let written = (MAGIC.len() + 4 + 8 + header.len()) as u64 + offset;
    debug!("Encoded container: {} bytes, {} buffers", written, buffers.len());
    Ok(written)
}

fn describe(
    vars: &BTreeMap<String, Variable>,
    offset: &mut u64,
    buffers: &mut Vec<Vec<u8>>,
) -> Result<BTreeMap<String, VariableHeader>> {
    let mut headers = BTreeMap::new();
    for (name, var) in vars {
        check_attrs(name, var.attrs())?;
        let bytes = var.data().to_le_bytes();
        let length = bytes.len() as u64;
        headers.insert(
            name.clone(),
            VariableHeader {
                dims: var.dims().to_vec(),
                shape: var.shape().to_vec(),
                dtype: var.dtype(),
                attrs: var.attrs().clone(),
                offset: *offset,
                length,
            },
        );
        *offset += length;
        buffers.push(bytes);
    }
    Ok(headers)
}

/// JSON has no encoding for NaN or infinity.
fn check_attrs(owner: &str, attrs: &Attrs) -> Result<()> {
    for (key, value) in attrs {
        if let AttrValue::Float(f) = value {
            if !f.is_finite() {
                return Err(ZeitError::validation(
                    format!("{}.{}", owner, key),
                    format!("attribute value {} cannot be stored", f),
                ));
            }
        }
    }
    Ok(())
}

/// Read a collection written by [`encode`].
pub fn decode<R: Read>(reader: &mut R) -> Result<Dataset> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "magic")?;
    if &magic != MAGIC {
        return Err(ZeitError::corrupt(format!(
            "not a zeitcache container (magic {:?})",
            magic
        )));
    }

    let mut word = [0u8; 4];
    read_exact(reader, &mut word, "version")?;
    let version = u32::from_le_bytes(word);
    if version != VERSION {
        return Err(ZeitError::corrupt(format!(
            "unsupported container version {} (expected {})",
            version, VERSION
        )));
    }

    let mut long = [0u8; 8];
    read_exact(reader, &mut long, "header length")?;
    let header_len = u64::from_le_bytes(long);
    if header_len > MAX_HEADER_LEN {
        return Err(ZeitError::corrupt(format!(
            "header length {} exceeds limit",
            header_len
        )));
    }

    let mut header = vec![0u8; header_len as usize];
    read_exact(reader, &mut header, "header")?;
    let header: ContainerHeader = serde_json::from_slice(&header)
        .map_err(|e| ZeitError::corrupt(format!("Invalid container header: {}", e)))?;

    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut dataset = Dataset::new();
    for (name, var) in header.coords {
        let var = restore_variable(&name, var, &data)?;
        dataset.insert_coord(name, var).map_err(as_corrupt)?;
    }
    for (name, var) in header.data_vars {
        let var = restore_variable(&name, var, &data)?;
        dataset.insert_var(name, var).map_err(as_corrupt)?;
    }
    dataset.attrs_mut().extend(header.attrs);
    Ok(dataset)
}

fn restore_variable(name: &str, header: VariableHeader, data: &[u8]) -> Result<Variable> {
    let expected = header
        .shape
        .iter()
        .try_fold(header.dtype.item_size(), |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| ZeitError::corrupt(format!("{}: shape overflows", name)))?;
    if header.length != expected as u64 {
        return Err(ZeitError::corrupt(format!(
            "{}: buffer length {} does not match shape {:?} of {}",
            name, header.length, header.shape, header.dtype
        )));
    }

    let start = usize::try_from(header.offset)
        .map_err(|_| ZeitError::corrupt(format!("{}: offset out of range", name)))?;
    let bytes = start
        .checked_add(expected)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            ZeitError::corrupt(format!(
                "{}: buffer {}..+{} outside data section of {} bytes",
                name,
                header.offset,
                header.length,
                data.len()
            ))
        })?;

    let array = ArrayData::from_le_bytes(header.dtype, &header.shape, bytes).map_err(as_corrupt)?;
    Ok(Variable::new(header.dims, array)
        .map_err(as_corrupt)?
        .with_attrs(header.attrs))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ZeitError::corrupt(format!("container truncated while reading {}", what))
        } else {
            e.into()
        }
    })
}

fn as_corrupt(err: ZeitError) -> ZeitError {
    match err {
        err @ ZeitError::Io { .. } => err,
        other => ZeitError::corrupt(other.to_string()),
    }
}
