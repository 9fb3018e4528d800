//! `persist_mem_slices` (§4.4, §6): materialize an in-memory slice to a
//! throwaway chunked-array group under `temp_dir` before acquisition
//! resolves it, so a caller handing over a large in-memory [`Dataset`]
//! doesn't hold the whole thing live for the length of one append. The
//! written copy is unchunked (one chunk per variable) and untransacted —
//! it is scratch staging, not the cube itself, so a crash mid-write simply
//! leaves an orphaned directory under `temp_dir` rather than corrupting
//! anything the journal is responsible for.

use serde_json::{json, Value};

use super::Dataset;
use crate::fsys::Filesystem;
use crate::store::{self, ArrayMeta, Compressor};
use crate::Result;

pub fn persist_to_temp(fs: &dyn Filesystem, base: &str, dataset: &Dataset) -> Result<()> {
    fs.write(&store::group_meta_path(base), store::ZGROUP_DOC.as_bytes())?;
    fs.write(
        &store::group_attrs_path(base),
        &serde_json::to_vec(&Value::Object(dataset.attrs.clone())).unwrap_or_default(),
    )?;

    for (name, var) in &dataset.variables {
        let shape = var.shape();
        let meta = ArrayMeta {
            shape: shape.clone(),
            chunks: shape,
            dtype: var.dtype,
            fill_value: 0.0,
            scale_factor: None,
            add_offset: None,
            compressor: Compressor::None,
            filters: Vec::new(),
        };
        fs.write(
            &store::array_meta_path(base, name),
            &serde_json::to_vec(&meta.to_json()).unwrap_or_default(),
        )?;

        let mut attrs = var.attrs.clone();
        attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(var.dims));
        fs.write(
            &store::array_attrs_path(base, name),
            &serde_json::to_vec(&Value::Object(attrs)).unwrap_or_default(),
        )?;

        let data: Vec<f64> = var.data.iter().copied().collect();
        let writes = store::chunk_writes(&data, base, name, &meta, 0, 0..1)?;
        for w in writes {
            if let Some(bytes) = w.bytes {
                fs.write(&w.path, &bytes)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;
