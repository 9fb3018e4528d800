//! Cube schema derivation (§4.3): given the first slice and configuration,
//! produce the dimension/variable/encoding record the rest of the crate
//! treats as ground truth, then validate every subsequent slice against it.
//!
//! Grounded on `core.rs`'s generic merge-by-precedence pattern (explicit
//! override, wildcard override, inferred-from-data) and the `zarrs` array
//! model for what an encoding record must carry.

mod state;
mod validate;

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::config::{Config, EncodingOverride, VariableOverride};
use crate::slice::Dataset;
use crate::store::{ArrayMeta, Compressor, Dtype};
use crate::{err_at, Result};

pub use state::{read_cube_state, CubeState};
pub use validate::validate_slice;

/// A variable's full schema: its dimensions (in order) and its persisted
/// encoding.
#[derive(Debug, Clone)]
pub struct VariableSchema {
    pub dims: Vec<String>,
    pub encoding: ArrayMeta,
}

/// The cube schema derived once, from the first slice merged with
/// configuration, and held fixed for the cube's lifetime.
#[derive(Debug, Clone)]
pub struct Schema {
    pub append_dim: String,
    /// Chunk size along the append axis — fixed to the first slice's size
    /// along that axis for the life of the cube (I1).
    pub append_chunk: u64,
    /// Sizes of every other (non-append) dimension the cube declares.
    pub fixed_dims: HashMap<String, u64>,
    pub variables: HashMap<String, VariableSchema>,
}

impl Schema {
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }
}

fn keep_variable(name: &str, config: &Config) -> bool {
    if let Some(included) = &config.included_variables {
        if !included.iter().any(|n| n == name) {
            return false;
        }
    }
    !config.excluded_variables.iter().any(|n| n == name)
}

/// Merge (decreasing precedence) explicit `variables[name]`, wildcard
/// `variables["*"]`, into one override, leaving unset fields to be filled
/// from the slice itself.
fn merged_override(name: &str, config: &Config) -> VariableOverride {
    let wildcard = config.variables.get("*").cloned().unwrap_or_default();
    let explicit = config.variables.get(name).cloned();
    match explicit {
        None => wildcard,
        Some(mut explicit) => {
            if explicit.dims.is_none() {
                explicit.dims = wildcard.dims;
            }
            explicit.encoding = merge_encoding(explicit.encoding, wildcard.encoding);
            for (k, v) in wildcard.attrs {
                explicit.attrs.entry(k).or_insert(v);
            }
            explicit
        }
    }
}

fn merge_encoding(mut explicit: EncodingOverride, wildcard: EncodingOverride) -> EncodingOverride {
    explicit.dtype = explicit.dtype.or(wildcard.dtype);
    explicit.chunks = explicit.chunks.or(wildcard.chunks);
    explicit.fill_value = explicit.fill_value.or(wildcard.fill_value);
    explicit.scale_factor = explicit.scale_factor.or(wildcard.scale_factor);
    explicit.add_offset = explicit.add_offset.or(wildcard.add_offset);
    explicit.units = explicit.units.or(wildcard.units);
    explicit.calendar = explicit.calendar.or(wildcard.calendar);
    explicit.compressor = explicit.compressor.or(wildcard.compressor);
    explicit.filters = explicit.filters.or(wildcard.filters);
    explicit
}

/// Derive the cube schema `K` from the first slice `S0` and configuration.
pub fn derive_schema(s0: &Dataset, config: &Config) -> Result<Schema> {
    let append_dim = config.append_dim.clone();
    let append_chunk = match s0.dim_size(&append_dim) {
        Some(n) if n > 0 => n,
        Some(_) => return err_at!(Config, msg: "slice append axis {:?} has size 0", append_dim),
        None => return err_at!(SliceSchema, msg: "first slice does not declare append axis {:?}", append_dim),
    };

    let mut variables = HashMap::new();
    for (name, var) in &s0.variables {
        if !keep_variable(name, config) {
            continue;
        }
        let over = merged_override(name, config);
        let dims = over.dims.clone().unwrap_or_else(|| var.dims.clone());

        let is_coordinate = dims.len() == 1 && dims[0] == *name;
        let mut chunks = Vec::with_capacity(dims.len());
        for (axis, dim) in dims.iter().enumerate() {
            let requested = over
                .encoding
                .chunks
                .as_ref()
                .and_then(|c| c.get(axis).copied().flatten());
            let dim_size = if *dim == append_dim {
                append_chunk
            } else {
                config
                    .fixed_dims
                    .get(dim)
                    .copied()
                    .unwrap_or_else(|| var.data.shape()[axis] as u64)
            };
            let chunk = if *dim == append_dim {
                match requested {
                    Some(v) if v != append_chunk => {
                        return err_at!(
                            Config,
                            msg: "variables.{}.encoding.chunks: append-axis chunk must equal the slice's append size ({}), got {}",
                            name, append_chunk, v
                        );
                    }
                    _ => append_chunk,
                }
            } else {
                match requested {
                    Some(v) => v,
                    None if is_coordinate => dim_size,
                    None => dim_size,
                }
            };
            chunks.push(chunk);
        }

        let shape: Vec<u64> = dims
            .iter()
            .enumerate()
            .map(|(axis, dim)| {
                if *dim == append_dim {
                    append_chunk
                } else {
                    config
                        .fixed_dims
                        .get(dim)
                        .copied()
                        .unwrap_or_else(|| var.data.shape()[axis] as u64)
                }
            })
            .collect();

        let dtype = match &over.encoding.dtype {
            Some(s) => Dtype::parse(s)?,
            None => var.dtype,
        };
        let compressor = match &over.encoding.compressor {
            Some(s) => Compressor::parse(s)?,
            None => Compressor::None,
        };
        let fill_value = over
            .encoding
            .fill_value
            .as_ref()
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let encoding = ArrayMeta {
            shape,
            chunks,
            dtype,
            fill_value,
            scale_factor: over.encoding.scale_factor,
            add_offset: over.encoding.add_offset,
            compressor,
            filters: over.encoding.filters.unwrap_or_default(),
        };

        variables.insert(name.clone(), VariableSchema { dims, encoding });
    }

    if variables.is_empty() {
        return err_at!(SliceSchema, msg: "first slice has no variables after include/exclude filtering");
    }

    let mut fixed_dims = HashMap::new();
    for schema in variables.values() {
        for (axis, dim) in schema.dims.iter().enumerate() {
            if *dim != append_dim {
                fixed_dims.insert(dim.clone(), schema.encoding.shape[axis]);
            }
        }
    }

    Ok(Schema {
        append_dim,
        append_chunk,
        fixed_dims,
        variables,
    })
}

/// Merge cube-level group attributes: S0's attributes overlaid with
/// configuration `attrs` (config wins at the leaf, matching `raw::merge_values`).
pub fn merge_create_attrs(s0_attrs: &Map<String, Value>, config: &Config) -> Map<String, Value> {
    let mut merged = s0_attrs.clone();
    for (k, v) in &config.attrs {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
