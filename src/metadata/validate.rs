//! Validation of a subsequent slice `S` against the established cube schema
//! `K` (§4.3): missing variables, dimension/shape mismatches, and the
//! append-axis step constraint.

use super::Schema;
use crate::config::AppendStep;
use crate::slice::Dataset;
use crate::{err_at, Result};

/// Validate `slice` against `schema`. `last_label` is the cube's current
/// last append-axis coordinate label, if the append axis has a coordinate
/// and the cube is non-empty (`None` on the very first append). `append_step`
/// is the configured step constraint between consecutive labels (§6.2).
pub fn validate_slice(
    schema: &Schema,
    slice: &Dataset,
    last_label: Option<f64>,
    append_step: &AppendStep,
) -> Result<()> {
    for (name, var_schema) in &schema.variables {
        let var = match slice.variables.get(name) {
            Some(v) => v,
            None => return err_at!(SliceSchema, msg: "slice is missing required variable {:?}", name),
        };

        if var.dims != var_schema.dims {
            return err_at!(
                SliceSchema,
                msg: "variable {:?}: dims {:?} do not match cube schema {:?}",
                name, var.dims, var_schema.dims
            );
        }

        let shape = var.shape();
        for (axis, dim) in var_schema.dims.iter().enumerate() {
            if *dim == schema.append_dim {
                if shape[axis] != schema.append_chunk {
                    return err_at!(
                        SliceShape,
                        msg: "variable {:?}: append-axis size {} does not equal cube chunk size {}",
                        name, shape[axis], schema.append_chunk
                    );
                }
            } else if shape[axis] != var_schema.encoding.shape[axis] {
                return err_at!(
                    SliceShape,
                    msg: "variable {:?}: dimension {:?} size {} does not match cube size {}",
                    name, dim, shape[axis], var_schema.encoding.shape[axis]
                );
            }
        }
    }

    if let Some(coord) = slice.coordinate(&schema.append_dim) {
        validate_append_order(&coord, last_label, append_step)?;
    }

    Ok(())
}

fn validate_append_order(coord: &[f64], last_label: Option<f64>, step: &AppendStep) -> Result<()> {
    // Intra-slice monotonicity: consecutive labels within the slice itself
    // must respect the same step constraint as the cube-to-slice boundary.
    for window in coord.windows(2) {
        check_step(step, window[0], window[1])?;
    }
    if let (Some(last), Some(&first)) = (last_label, coord.first()) {
        check_step(step, last, first)?;
    }
    Ok(())
}

fn check_step(step: &AppendStep, prev: f64, next: f64) -> Result<()> {
    match step {
        AppendStep::Unconstrained => Ok(()),
        AppendStep::Increasing if next > prev => Ok(()),
        AppendStep::Decreasing if next < prev => Ok(()),
        AppendStep::Delta(d) if (next - prev - d).abs() < 1e-9 => Ok(()),
        AppendStep::Duration(d) => {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if (next - prev - secs).abs() < 1e-6 {
                Ok(())
            } else {
                err_at!(AppendOrder, msg: "append-axis step {} does not match configured duration {}", next - prev, secs)
            }
        }
        _ => err_at!(AppendOrder, msg: "append-axis step from {} to {} violates append_step constraint", prev, next),
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;
