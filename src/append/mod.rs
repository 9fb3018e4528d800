//! Append Engine (§4.6): the CREATE/APPEND state machine that materializes a
//! slice into a cube, journalling every write so a crash mid-transaction
//! leaves either the prior committed state or nothing at all.
//!
//! Grounded on the teacher's `db::Db::set`-then-`wral`-journal sequencing —
//! validate, open a transaction, mutate, commit or unwind — generalized here
//! from one key/value write to a whole slice's worth of chunk and metadata
//! documents.

mod attrs;

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::config::{AttrsUpdateMode, Config};
use crate::fsys::Filesystem;
use crate::metadata::{self, CubeState, Schema, VariableSchema};
use crate::slice::{self, Dataset};
use crate::store;
use crate::txn::{self, Transaction};
use crate::{err_at, Result};

/// Which of the two append-engine paths a slice took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Appended,
}

/// Materialize one slice into the cube at `target`. Dispatches to the CREATE
/// or APPEND path depending on whether the cube already exists.
pub fn run(
    fs: &dyn Filesystem,
    target: &str,
    temp_dir: &str,
    config: &Config,
    dataset: Dataset,
) -> Result<Outcome> {
    if fs.exists(&store::group_meta_path(target))? {
        append_path(fs, target, temp_dir, config, dataset)
    } else {
        create_path(fs, target, temp_dir, config, dataset)
    }
}

fn create_path(
    fs: &dyn Filesystem,
    target: &str,
    temp_dir: &str,
    config: &Config,
    s0: Dataset,
) -> Result<Outcome> {
    let schema = metadata::derive_schema(&s0, config)?;
    let mut txn = Transaction::open(fs, temp_dir, txn::Kind::Create, target, Vec::new(), config.disable_rollback)?;

    match write_create(fs, &mut txn, target, config, &schema, &s0) {
        Ok(()) => {
            txn.commit()?;
            Ok(Outcome::Created)
        }
        Err(e) => Err(txn.abort(e)),
    }
}

fn write_create(
    fs: &dyn Filesystem,
    txn: &mut Transaction,
    target: &str,
    config: &Config,
    schema: &Schema,
    s0: &Dataset,
) -> Result<()> {
    let group_meta = store::group_meta_path(target);
    txn.add(&group_meta)?;
    fs.write(&group_meta, store::ZGROUP_DOC.as_bytes())?;

    for (name, var_schema) in &schema.variables {
        let var = s0
            .variables
            .get(name)
            .expect("kept variable present in first slice by construction");

        let meta_path = store::array_meta_path(target, name);
        txn.add(&meta_path)?;
        fs.write(&meta_path, &serde_json::to_vec(&var_schema.encoding.to_json()).unwrap_or_default())?;

        let attrs_path = store::array_attrs_path(target, name);
        let mut attrs = var.attrs.clone();
        attrs.insert("_ARRAY_DIMENSIONS".to_string(), Value::Array(
            var_schema.dims.iter().cloned().map(Value::String).collect(),
        ));
        txn.add(&attrs_path)?;
        fs.write(&attrs_path, &serde_json::to_vec(&Value::Object(attrs)).unwrap_or_default())?;

        let axis = append_axis(var_schema, &schema.append_dim)?;
        let flat: Vec<f64> = var.data.iter().copied().collect();
        let grid = store::chunk_grid(&var_schema.encoding);
        let writes = store::chunk_writes(&flat, target, name, &var_schema.encoding, axis, 0..grid[axis])?;
        for w in writes {
            if let Some(bytes) = w.bytes {
                txn.add(&w.path)?;
                fs.write(&w.path, &bytes)?;
            }
        }
    }

    let merged = metadata::merge_create_attrs(&s0.attrs, config);
    let final_attrs = resolve_attrs(fs, target, config, merged)?;
    let group_attrs = store::group_attrs_path(target);
    txn.add(&group_attrs)?;
    fs.write(&group_attrs, &serde_json::to_vec(&Value::Object(final_attrs)).unwrap_or_default())?;

    Ok(())
}

fn append_path(
    fs: &dyn Filesystem,
    target: &str,
    temp_dir: &str,
    config: &Config,
    slice: Dataset,
) -> Result<Outcome> {
    let state = metadata::read_cube_state(fs, target, &config.append_dim)?;
    let last_label = last_append_label(fs, target, &state)?;
    metadata::validate_slice(&state.schema, &slice, last_label, &config.append_step)?;

    let pre_state: Vec<txn::PreState> = state
        .schema
        .variables
        .keys()
        .map(|name| txn::PreState { variable: name.clone(), append_length: state.append_length })
        .collect();

    let mut txn = Transaction::open(fs, temp_dir, txn::Kind::Append, target, pre_state, config.disable_rollback)?;

    match write_append(fs, &mut txn, target, config, &state, &slice) {
        Ok(()) => {
            txn.commit()?;
            Ok(Outcome::Appended)
        }
        Err(e) => Err(txn.abort(e)),
    }
}

fn write_append(
    fs: &dyn Filesystem,
    txn: &mut Transaction,
    target: &str,
    config: &Config,
    state: &CubeState,
    slice: &Dataset,
) -> Result<()> {
    let chunk_offset = state.append_length / state.schema.append_chunk;
    let mut updated: HashMap<String, VariableSchema> = state.schema.variables.clone();

    for (name, var_schema) in &state.schema.variables {
        let var = slice
            .variables
            .get(name)
            .expect("slice validated to carry every cube variable");

        let axis = append_axis(var_schema, &state.schema.append_dim)?;
        let mut local_encoding = var_schema.encoding.clone();
        local_encoding.shape[axis] = state.schema.append_chunk;

        let flat: Vec<f64> = var.data.iter().copied().collect();
        let writes = store::chunk_writes_offset(&flat, target, name, &local_encoding, axis, chunk_offset)?;
        for w in writes {
            if let Some(bytes) = w.bytes {
                txn.add(&w.path)?;
                fs.write(&w.path, &bytes)?;
            }
        }

        let mut new_encoding = var_schema.encoding.clone();
        new_encoding.shape[axis] += state.schema.append_chunk;
        let meta_path = store::array_meta_path(target, name);
        txn.replace(&meta_path)?;
        fs.write(&meta_path, &serde_json::to_vec(&new_encoding.to_json()).unwrap_or_default())?;

        updated.insert(name.clone(), VariableSchema { dims: var_schema.dims.clone(), encoding: new_encoding });
    }

    let consolidated_path = store::consolidated_meta_path(target);
    if fs.exists(&consolidated_path)? {
        let updated_schema = Schema {
            append_dim: state.schema.append_dim.clone(),
            append_chunk: state.schema.append_chunk,
            fixed_dims: state.schema.fixed_dims.clone(),
            variables: updated,
        };
        let doc = rebuild_consolidated(fs, target, &updated_schema)?;
        txn.replace(&consolidated_path)?;
        fs.write(&consolidated_path, &serde_json::to_vec(&doc).unwrap_or_default())?;
    }

    if config.attrs_update_mode != AttrsUpdateMode::Ignore {
        let group_attrs_path = store::group_attrs_path(target);
        let existing = store::read_attrs(fs, &group_attrs_path)?;
        let merged = apply_update_mode(config.attrs_update_mode, &existing, &slice.attrs);
        let mut merged = merged;
        for (k, v) in &config.attrs {
            merged.insert(k.clone(), v.clone());
        }
        let final_attrs = resolve_attrs(fs, target, config, merged)?;
        txn.replace(&group_attrs_path)?;
        fs.write(&group_attrs_path, &serde_json::to_vec(&Value::Object(final_attrs)).unwrap_or_default())?;
    }

    Ok(())
}

fn append_axis(var_schema: &VariableSchema, append_dim: &str) -> Result<usize> {
    match var_schema.dims.iter().position(|d| d == append_dim) {
        Some(axis) => Ok(axis),
        None => err_at!(Internal, msg: "variable missing append axis {:?} after schema validation", append_dim),
    }
}

fn apply_update_mode(mode: AttrsUpdateMode, existing: &Map<String, Value>, incoming: &Map<String, Value>) -> Map<String, Value> {
    match mode {
        AttrsUpdateMode::Keep | AttrsUpdateMode::Ignore => existing.clone(),
        AttrsUpdateMode::Replace => incoming.clone(),
        AttrsUpdateMode::Update => {
            let mut merged = existing.clone();
            for (k, v) in incoming {
                merged.insert(k.clone(), v.clone());
            }
            merged
        }
    }
}

/// Evaluate `{{ ... }}` expressions in `attrs` against a freshly-read view of
/// `target` when enabled, leaving `attrs` untouched otherwise (§4.6).
fn resolve_attrs(fs: &dyn Filesystem, target: &str, config: &Config, attrs: Map<String, Value>) -> Result<Map<String, Value>> {
    if !config.permit_eval {
        return Ok(attrs);
    }
    let view = slice::read_dataset(fs, target)?;
    attrs::evaluate(attrs, &view)
}

fn last_append_label(fs: &dyn Filesystem, target: &str, state: &CubeState) -> Result<Option<f64>> {
    let coord_schema = match state.schema.variables.get(&state.schema.append_dim) {
        Some(vs) if vs.dims.len() == 1 && vs.dims[0] == state.schema.append_dim => vs,
        _ => return Ok(None),
    };
    let values = store::read_array(fs, target, &state.schema.append_dim, &coord_schema.encoding)?;
    Ok(values.last().copied())
}

fn rebuild_consolidated(fs: &dyn Filesystem, target: &str, schema: &Schema) -> Result<Value> {
    let mut metadata = Map::new();
    let zgroup: Value = err_at!(Transaction, serde_json::from_str(store::ZGROUP_DOC))?;
    metadata.insert(".zgroup".to_string(), zgroup);
    let group_attrs = store::read_attrs(fs, &store::group_attrs_path(target))?;
    metadata.insert(".zattrs".to_string(), Value::Object(group_attrs));

    for (name, var_schema) in &schema.variables {
        metadata.insert(format!("{}/.zarray", name), var_schema.encoding.to_json());
        let var_attrs = store::read_attrs(fs, &store::array_attrs_path(target, name))?;
        metadata.insert(format!("{}/.zattrs", name), Value::Object(var_attrs));
    }

    let mut doc = Map::new();
    doc.insert("zarr_consolidated_format".to_string(), Value::from(1));
    doc.insert("metadata".to_string(), Value::Object(metadata));
    Ok(Value::Object(doc))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
