//! HDF5 backend, reading the whole file into a [`Container`].
//!
//! String datasets and attributes are decoded here, whether stored as
//! fixed-length byte strings or variable-length text.

use crate::container::{AttrValue, Container, Dataset, Dtype, Entry, Group, Values};
use crate::error::{Error, Result};

use hdf5::types::{FixedAscii, FixedUnicode, FloatSize, IntSize, TypeDescriptor};
use hdf5::types::{VarLenAscii, VarLenUnicode};
use std::path::Path;

// Longest fixed-length string read without truncation.
const MAX_FIXED_LEN: usize = 1024;

pub fn load(path: &Path) -> Result<Container> {
    let format_err = |message: String| Error::Format {
        path: path.to_path_buf(),
        message,
    };
    let file = hdf5::File::open(path).map_err(|e| format_err(e.to_string()))?;
    let root = read_group(&file, "").map_err(format_err)?;
    log::debug!("read {} with {} top level members", path.display(), root.children().len());
    Ok(Container::new(path, root))
}

fn read_group(group: &hdf5::Group, at: &str) -> std::result::Result<Group, String> {
    let wrap = |e: hdf5::Error| format!("{}: {}", if at.is_empty() { "/" } else { at }, e);

    let mut out = Group::new();
    for name in group.attr_names().map_err(wrap)? {
        let attr = group.attr(&name).map_err(wrap)?;
        let (shape, _, values) = read_values(&attr).map_err(wrap)?;
        out.set_attr(name, attr_value(&shape, values));
    }
    for name in group.member_names().map_err(wrap)? {
        let child_path = if at.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", at, name)
        };
        let entry = match group.group(&name) {
            Ok(child) => Entry::Group(read_group(&child, &child_path)?),
            Err(_) => {
                let ds = group.dataset(&name).map_err(wrap)?;
                let (shape, dtype, values) = read_values(&ds).map_err(wrap)?;
                Entry::Dataset(
                    Dataset::new(shape, dtype, values).map_err(|e| format!("{}: {}", child_path, e))?,
                )
            }
        };
        out.insert(name, entry);
    }
    Ok(out)
}

fn int_bits(size: IntSize) -> u8 {
    match size {
        IntSize::U1 => 8,
        IntSize::U2 => 16,
        IntSize::U4 => 32,
        IntSize::U8 => 64,
    }
}

fn read_values(c: &hdf5::Container) -> hdf5::Result<(Vec<usize>, Dtype, Values)> {
    let shape = c.shape();
    let (dtype, values) = match c.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(size) => (Dtype::Int(int_bits(size)), Values::Int(c.read_raw::<i64>()?)),
        TypeDescriptor::Unsigned(size) => {
            let values = c
                .read_raw::<u64>()?
                .into_iter()
                .map(|v| {
                    i64::try_from(v).map_err(|_| hdf5::Error::from(format!("unsigned value {} exceeds int64", v)))
                })
                .collect::<hdf5::Result<Vec<i64>>>()?;
            (Dtype::UInt(int_bits(size)), Values::Int(values))
        }
        TypeDescriptor::Float(size) => {
            let bits = if matches!(size, FloatSize::U4) { 32 } else { 64 };
            (Dtype::Float(bits), Values::Float(c.read_raw::<f64>()?))
        }
        TypeDescriptor::Boolean => (
            Dtype::Bool,
            Values::Int(c.read_raw::<bool>()?.into_iter().map(i64::from).collect()),
        ),
        TypeDescriptor::VarLenUnicode => (
            Dtype::Str,
            Values::Text(c.read_raw::<VarLenUnicode>()?.iter().map(|s| s.as_str().to_owned()).collect()),
        ),
        TypeDescriptor::VarLenAscii => (
            Dtype::Str,
            Values::Text(c.read_raw::<VarLenAscii>()?.iter().map(|s| s.as_str().to_owned()).collect()),
        ),
        TypeDescriptor::FixedAscii(_) => (
            Dtype::Str,
            Values::Text(
                c.read_raw::<FixedAscii<MAX_FIXED_LEN>>()?
                    .iter()
                    .map(|s| s.as_str().to_owned())
                    .collect(),
            ),
        ),
        TypeDescriptor::FixedUnicode(_) => (
            Dtype::Str,
            Values::Text(
                c.read_raw::<FixedUnicode<MAX_FIXED_LEN>>()?
                    .iter()
                    .map(|s| s.as_str().to_owned())
                    .collect(),
            ),
        ),
        other => return Err(hdf5::Error::from(format!("unsupported element type {:?}", other))),
    };
    Ok((shape, dtype, values))
}

fn attr_value(shape: &[usize], values: Values) -> AttrValue {
    let scalar = shape.iter().product::<usize>() == 1;
    match values {
        Values::Int(v) if scalar => AttrValue::Int(v[0]),
        Values::Float(v) if scalar => AttrValue::Float(v[0]),
        Values::Text(mut v) if scalar => AttrValue::Text(v.remove(0)),
        Values::Text(v) => AttrValue::Text(format!("[{}]", v.join(", "))),
        other => AttrValue::Array(other.to_f64().unwrap_or_default()),
    }
}
