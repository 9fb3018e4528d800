//! In-memory slice/cube view: the shape acquisition resolves a handle into,
//! and the shape the append engine reads a freshly-written cube back as (for
//! attribute-expression evaluation, §4.6).

use ndarray::ArrayD;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::store::Dtype;

/// One variable's data and declared shape, already normalized to `f64` so
/// the rest of the crate never branches on the storage dtype until the
/// final pack-to-bytes step (see `store::encode_chunk`).
#[derive(Debug, Clone)]
pub struct Variable {
    pub dims: Vec<String>,
    pub dtype: Dtype,
    pub data: ArrayD<f64>,
    pub attrs: Map<String, Value>,
}

impl Variable {
    pub fn shape(&self) -> Vec<u64> {
        self.data.shape().iter().map(|&n| n as u64).collect()
    }
}

/// A cube-shaped dataset: the unit both slices and the cube itself are
/// represented as in memory.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub variables: HashMap<String, Variable>,
    pub attrs: Map<String, Value>,
}

impl Dataset {
    pub fn new() -> Dataset {
        Dataset::default()
    }

    /// Size of `dim` as declared by any variable that carries it. `None` if
    /// no variable in this dataset declares the dimension.
    pub fn dim_size(&self, dim: &str) -> Option<u64> {
        self.variables.values().find_map(|v| {
            v.dims
                .iter()
                .position(|d| d == dim)
                .map(|axis| v.data.shape()[axis] as u64)
        })
    }

    /// The append-axis coordinate labels, if `append_dim` has a coordinate
    /// variable (a variable named after the dimension, one-dimensional).
    pub fn coordinate(&self, append_dim: &str) -> Option<Vec<f64>> {
        let var = self.variables.get(append_dim)?;
        if var.dims.len() != 1 || var.dims[0] != append_dim {
            return None;
        }
        Some(var.data.iter().copied().collect())
    }
}
