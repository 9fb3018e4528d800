//! The "raw" configuration document: one all-[`Option`] struct per §6.2 of
//! the specification, deserialized directly off TOML or JSON text with no
//! defaulting or validation. Defaulting and validation happen once, in the
//! fallible `RawConfig -> Config` conversion (see `super::Config::try_from`).

use serde::Deserialize;
use std::{collections::HashMap, path};

use crate::{err_at, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawVariable {
    pub dims: Option<Vec<String>>,
    pub encoding: Option<RawEncoding>,
    pub attrs: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEncoding {
    pub dtype: Option<String>,
    pub chunks: Option<Vec<Option<u64>>>,
    pub fill_value: Option<serde_json::Value>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub units: Option<String>,
    pub calendar: Option<String>,
    pub compressor: Option<String>,
    pub filters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLogging {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub target_dir: Option<String>,
    pub target_storage_options: Option<HashMap<String, String>>,
    pub append_dim: Option<String>,
    pub append_step: Option<serde_json::Value>,
    pub fixed_dims: Option<HashMap<String, u64>>,
    pub included_variables: Option<Vec<String>>,
    pub excluded_variables: Option<Vec<String>>,
    pub variables: Option<HashMap<String, RawVariable>>,
    pub attrs: Option<serde_json::Map<String, serde_json::Value>>,
    pub attrs_update_mode: Option<String>,
    pub permit_eval: Option<bool>,
    pub zarr_version: Option<u8>,
    pub slice_storage_options: Option<HashMap<String, String>>,
    pub slice_engine: Option<String>,
    pub slice_polling: Option<serde_json::Value>,
    pub slice_source: Option<String>,
    pub slice_source_kwargs: Option<serde_json::Map<String, serde_json::Value>>,
    pub persist_mem_slices: Option<bool>,
    pub temp_dir: Option<String>,
    pub temp_storage_options: Option<HashMap<String, String>>,
    pub disable_rollback: Option<bool>,
    pub force_new: Option<bool>,
    pub dry_run: Option<bool>,
    pub profiling: Option<bool>,
    pub logging: Option<RawLogging>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parse a single configuration document (TOML unless the path ends in
/// `.json`) into a generic [`serde_json::Value`] so TOML and JSON sources can
/// be merged through one code path.
pub fn read_document(path: &path::Path) -> Result<serde_json::Value> {
    let text = err_at!(Io, std::fs::read_to_string(path), "reading config {:?}", path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        err_at!(Config, serde_json::from_str(&text), "parsing {:?} as json", path)
    } else {
        let toml_val: toml::Value =
            err_at!(Config, toml::from_str(&text), "parsing {:?} as toml", path)?;
        err_at!(Config, serde_json::to_value(toml_val), "converting {:?}", path)
    }
}

/// Deep-merge `overlay` into `base`: object fields merge key by key (later
/// wins at the leaf), everything else — scalars and arrays — is replaced
/// wholesale by the overlay's value.
pub fn merge_values(base: &mut serde_json::Value, overlay: serde_json::Value) {
    use serde_json::Value;

    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, val) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, val),
                    None => {
                        base_map.insert(key, val);
                    }
                }
            }
        }
        (slot, overlay_val) => *slot = overlay_val,
    }
}

/// Recursively apply environment-variable substitution to every string leaf.
pub fn substitute_env(value: &mut serde_json::Value) -> Result<()> {
    use serde_json::Value;

    match value {
        Value::String(s) => {
            *s = super::envsubst::substitute_env(s)?;
        }
        Value::Array(items) => {
            for item in items {
                substitute_env(item)?;
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                substitute_env(v)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

/// Load and merge a sequence of configuration files, later files winning at
/// the leaf, then deserialize the merged document into a [`RawConfig`].
pub fn load_merged(paths: &[path::PathBuf]) -> Result<RawConfig> {
    let mut merged = serde_json::Value::Object(serde_json::Map::new());
    for path in paths {
        let doc = read_document(path)?;
        merge_values(&mut merged, doc);
    }
    substitute_env(&mut merged)?;
    err_at!(Config, serde_json::from_value(merged), "validating merged configuration")
}

#[cfg(test)]
#[path = "raw_test.rs"]
mod raw_test;
