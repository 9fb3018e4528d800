//! Zarr v2 on-disk layout: JSON metadata documents (`.zarray`, `.zattrs`,
//! `.zgroup`) and chunk file paths/encoding. This module knows the *shape*
//! of the chunked-array format; it never performs I/O itself — every path it
//! computes is written or read by the caller through the filesystem facade
//! (so the transaction journal sees, and can roll back, every byte touched).
//!
//! Grounded on the `zarrs` crate's array/codec model for what an encoding
//! record must carry (dtype, chunk grid, fill value, codecs); the metadata
//! documents themselves are plain JSON per the Zarr v2 spec, the same way
//! the teacher's `bubt`/`robt` modules hand-roll their own on-disk index
//! format rather than pull in a third-party container format crate.

pub mod codec;
pub mod dtype;
pub mod io;

use serde_json::{json, Map, Value};

pub use codec::Compressor;
pub use dtype::Dtype;
pub use io::{chunk_grid, chunk_writes, chunk_writes_offset, read_array, ChunkWrite};

use crate::fsys::Filesystem;
use crate::{err_at, Result};

/// The encoding half of a variable's metadata: everything persisted in its
/// `.zarray` document.
#[derive(Debug, Clone)]
pub struct ArrayMeta {
    pub shape: Vec<u64>,
    pub chunks: Vec<u64>,
    pub dtype: Dtype,
    pub fill_value: f64,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub compressor: Compressor,
    pub filters: Vec<String>,
}

impl ArrayMeta {
    pub fn to_json(&self) -> Value {
        json!({
            "zarr_format": 2,
            "shape": self.shape,
            "chunks": self.chunks,
            "dtype": self.dtype.zarr_spelling(),
            "fill_value": self.fill_value,
            "scale_factor": self.scale_factor,
            "add_offset": self.add_offset,
            "compressor": match self.compressor.name() {
                "none" => Value::Null,
                name => json!({ "id": name }),
            },
            "filters": if self.filters.is_empty() { Value::Null } else { json!(self.filters) },
            "order": "C",
        })
    }

    pub fn from_json(value: &Value) -> Result<ArrayMeta> {
        let obj = match value.as_object() {
            Some(o) => o,
            None => return err_at!(Transaction, msg: ".zarray document is not an object"),
        };
        let shape = read_u64_array(obj, "shape")?;
        let chunks = read_u64_array(obj, "chunks")?;
        let dtype = Dtype::parse(obj.get("dtype").and_then(Value::as_str).unwrap_or(""))?;
        let fill_value = obj.get("fill_value").and_then(Value::as_f64).unwrap_or(0.0);
        let scale_factor = obj.get("scale_factor").and_then(Value::as_f64);
        let add_offset = obj.get("add_offset").and_then(Value::as_f64);
        let compressor = match obj.get("compressor") {
            None | Some(Value::Null) => Compressor::None,
            Some(v) => Compressor::parse(v.get("id").and_then(Value::as_str).unwrap_or("none"))?,
        };
        let filters = obj
            .get("filters")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        Ok(ArrayMeta {
            shape,
            chunks,
            dtype,
            fill_value,
            scale_factor,
            add_offset,
            compressor,
            filters,
        })
    }
}

fn read_u64_array(obj: &Map<String, Value>, field: &str) -> Result<Vec<u64>> {
    match obj.get(field).and_then(Value::as_array) {
        Some(a) => a
            .iter()
            .map(|v| match v.as_u64() {
                Some(n) => Ok(n),
                None => err_at!(Transaction, msg: "{} entry is not a non-negative integer", field),
            })
            .collect(),
        None => err_at!(Transaction, msg: "missing or malformed {:?}", field),
    }
}

/// Path of the group-level `.zgroup` marker.
pub fn group_meta_path(base: &str) -> String {
    format!("{}/.zgroup", base)
}

/// Path of the group-level attributes document.
pub fn group_attrs_path(base: &str) -> String {
    format!("{}/.zattrs", base)
}

/// Path of the group-level consolidated metadata document (optional; present
/// only once at least one append has run with consolidation enabled).
pub fn consolidated_meta_path(base: &str) -> String {
    format!("{}/.zmetadata", base)
}

/// Path of a variable's `.zarray` encoding document.
pub fn array_meta_path(base: &str, variable: &str) -> String {
    format!("{}/{}/.zarray", base, variable)
}

/// Path of a variable's `.zattrs` attributes document.
pub fn array_attrs_path(base: &str, variable: &str) -> String {
    format!("{}/{}/.zattrs", base, variable)
}

/// Path of one chunk file, indexed by its per-dimension chunk coordinates.
pub fn chunk_path(base: &str, variable: &str, indices: &[u64]) -> String {
    let key = indices
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    format!("{}/{}/{}", base, variable, key)
}

/// Pack logical `f64` values into a chunk's on-disk bytes: concatenate each
/// value's dtype-sized little-endian encoding, then compress.
pub fn encode_chunk(meta: &ArrayMeta, values: &[f64]) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(values.len() * meta.dtype.size_bytes());
    for v in values {
        raw.extend(meta.dtype.pack(*v, meta.scale_factor, meta.add_offset));
    }
    meta.compressor.encode(raw)
}

/// Inverse of [`encode_chunk`].
pub fn decode_chunk(meta: &ArrayMeta, bytes: Vec<u8>, count: usize) -> Result<Vec<f64>> {
    let width = meta.dtype.size_bytes();
    let raw = meta.compressor.decode(bytes, count * width)?;
    Ok((0..count)
        .map(|i| meta.dtype.unpack(&raw[i * width..(i + 1) * width], meta.scale_factor, meta.add_offset))
        .collect())
}

/// A chunk whose every logical value equals the fill value is not written to
/// disk (sparse store, §4.6 edge policy).
pub fn is_all_fill(values: &[f64], fill_value: f64) -> bool {
    values.iter().all(|v| *v == fill_value)
}

pub const ZGROUP_DOC: &str = r#"{"zarr_format":2}"#;

/// Read a JSON attributes document, or an empty object if it doesn't exist
/// (a `.zattrs` document is optional at both group and variable level).
pub(crate) fn read_attrs(fs: &dyn Filesystem, path: &str) -> Result<Map<String, Value>> {
    if !fs.exists(path)? {
        return Ok(Map::new());
    }
    let bytes = fs.read(path)?;
    let value: Value = err_at!(Transaction, serde_json::from_slice(&bytes), "parsing {:?}", path)?;
    Ok(value.as_object().cloned().unwrap_or_default())
}

/// Dimension names are stored as a `_ARRAY_DIMENSIONS` attribute (the same
/// convention xarray's zarr backend uses); fall back to positional `dim0..N`
/// names if absent so a bare zarr array can still be read as a slice.
pub(crate) fn dims_from_attrs(attrs: &Map<String, Value>, ndim: usize) -> Vec<String> {
    match attrs.get("_ARRAY_DIMENSIONS").and_then(Value::as_array) {
        Some(arr) if arr.len() == ndim => arr
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => (0..ndim).map(|i| format!("dim{}", i)).collect(),
    }
}

/// Read a variable's `.zarray` encoding document without touching its chunk
/// data — used where only the schema is needed (e.g. reopening an existing
/// cube ahead of an append).
pub fn read_array_meta(fs: &dyn Filesystem, base: &str, variable: &str) -> Result<ArrayMeta> {
    let path = array_meta_path(base, variable);
    let bytes = fs.read(&path)?;
    let json: Value = err_at!(Transaction, serde_json::from_slice(&bytes), "parsing {:?}", path)?;
    ArrayMeta::from_json(&json)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
