//! Reopening an existing cube ahead of an append: reads back the persisted
//! schema and the current append-axis length per variable (I1) without
//! touching any chunk data.

use std::collections::HashMap;

use super::{Schema, VariableSchema};
use crate::fsys::Filesystem;
use crate::store;
use crate::{err_at, Result};

/// The cube's schema plus its current length along the append axis — the
/// two facts the APPEND path needs from the existing store before it can
/// validate and place a new slice (§4.6 APPEND step 1).
#[derive(Debug, Clone)]
pub struct CubeState {
    pub schema: Schema,
    pub append_length: u64,
}

pub fn read_cube_state(fs: &dyn Filesystem, base: &str, append_dim: &str) -> Result<CubeState> {
    let mut variables = HashMap::new();
    let mut append_length = None;
    let mut append_chunk = None;

    for entry in fs.list(base)? {
        if !entry.is_dir {
            continue;
        }
        let name = match entry.path.rsplit('/').next() {
            Some(n) => n.to_string(),
            None => continue,
        };
        let meta_path = store::array_meta_path(base, &name);
        if !fs.exists(&meta_path)? {
            continue;
        }
        let meta = store::read_array_meta(fs, base, &name)?;
        let var_attrs = store::read_attrs(fs, &store::array_attrs_path(base, &name))?;
        let dims = store::dims_from_attrs(&var_attrs, meta.shape.len());

        if let Some(axis) = dims.iter().position(|d| d == append_dim) {
            let n = meta.shape[axis];
            let c = meta.chunks[axis];
            match append_length {
                Some(prev) if prev != n => {
                    return err_at!(
                        Internal,
                        msg: "variable {:?} append-axis length {} disagrees with {} seen on another variable",
                        name, n, prev
                    )
                }
                _ => append_length = Some(n),
            }
            match append_chunk {
                Some(prev) if prev != c => {
                    return err_at!(
                        Internal,
                        msg: "variable {:?} append-axis chunk {} disagrees with {} seen on another variable",
                        name, c, prev
                    )
                }
                _ => append_chunk = Some(c),
            }
        }

        variables.insert(name, VariableSchema { dims, encoding: meta });
    }

    let append_length = match append_length {
        Some(n) => n,
        None => return err_at!(Internal, msg: "cube at {:?} has no variable declaring append axis {:?}", base, append_dim),
    };
    let append_chunk = append_chunk.expect("append_length set implies append_chunk set");

    let mut fixed_dims = HashMap::new();
    for schema in variables.values() {
        for (axis, dim) in schema.dims.iter().enumerate() {
            if dim != append_dim {
                fixed_dims.insert(dim.clone(), schema.encoding.shape[axis]);
            }
        }
    }

    Ok(CubeState {
        schema: Schema {
            append_dim: append_dim.to_string(),
            append_chunk,
            fixed_dims,
            variables,
        },
        append_length,
    })
}

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;
