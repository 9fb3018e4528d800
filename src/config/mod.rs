//! Configuration loading: a [`RawConfig`] (all-[`Option`], deserialized
//! as-is from one or more TOML/JSON files) is deep-merged, environment-
//! substituted, and validated into an immutable [`Config`] that the rest of
//! the crate treats as ground truth for one run.
//!
//! Mirrors the teacher's `bin/pms/config.rs` split between a `Deserialize`
//! document type and a validated runtime type built from it via `TryFrom`.

mod envsubst;
pub mod raw;
mod schema;

use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    convert::TryFrom,
    path::PathBuf,
    time::Duration,
};

use crate::{err_at, Result};
use raw::RawConfig;
pub use raw::{RawEncoding, RawLogging, RawVariable};
pub use schema::{help_json, help_markdown};

/// How `attrs` from a new slice reconcile with the cube's existing
/// attributes on each append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrsUpdateMode {
    /// Keep the cube's existing attributes; ignore the slice's.
    Keep,
    /// Replace the cube's attributes wholesale with the slice's (absent keys
    /// are dropped). The default.
    Replace,
    /// Shallow-merge the slice's attributes on top of the cube's.
    Update,
    /// Never touch attributes after CREATE, even on the first append.
    Ignore,
}

impl Default for AttrsUpdateMode {
    fn default() -> Self {
        AttrsUpdateMode::Replace
    }
}

impl AttrsUpdateMode {
    fn parse(s: &str) -> Result<AttrsUpdateMode> {
        match s {
            "keep" => Ok(AttrsUpdateMode::Keep),
            "replace" => Ok(AttrsUpdateMode::Replace),
            "update" => Ok(AttrsUpdateMode::Update),
            "ignore" => Ok(AttrsUpdateMode::Ignore),
            other => err_at!(
                Config,
                msg: "attrs_update_mode: expected one of keep|replace|update|ignore, got {:?}",
                other
            ),
        }
    }
}

/// The append axis's admissible step between consecutive slices.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendStep {
    /// No constraint: any strictly-increasing-or-equal coordinate is fine.
    Unconstrained,
    /// `"+"`: each appended coordinate must be strictly greater than the last.
    Increasing,
    /// `"-"`: each appended coordinate must be strictly less than the last.
    Decreasing,
    /// An exact numeric step between consecutive coordinates.
    Delta(f64),
    /// An exact calendar step (e.g. `"1D"`, `"PT1H"`) between consecutive
    /// coordinates, for datetime append axes.
    Duration(chrono::Duration),
}

impl Default for AppendStep {
    fn default() -> Self {
        AppendStep::Unconstrained
    }
}

impl AppendStep {
    fn parse(value: &Value) -> Result<AppendStep> {
        match value {
            Value::Null => Ok(AppendStep::Unconstrained),
            Value::String(s) if s == "+" => Ok(AppendStep::Increasing),
            Value::String(s) if s == "-" => Ok(AppendStep::Decreasing),
            Value::String(s) => match parse_duration(s) {
                Some(d) => Ok(AppendStep::Duration(d)),
                None => err_at!(Config, msg: "append_step: unrecognised duration {:?}", s),
            },
            Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(AppendStep::Delta(f)),
                None => err_at!(Config, msg: "append_step: number out of range: {}", n),
            },
            other => err_at!(Config, msg: "append_step: expected null, \"+\", \"-\", a number, or a duration string, got {}", other),
        }
    }
}

/// Parse a small subset of ISO-8601-ish durations: `1D`, `2H`, `30M`, `10S`,
/// and bare `PT..`/`P..` forms delegate to [`chrono::Duration`]'s own units.
fn parse_duration(s: &str) -> Option<chrono::Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (num, unit) = s.split_at(s.len() - 1);
    let n: i64 = num.parse().ok()?;
    match unit {
        "D" | "d" => Some(chrono::Duration::days(n)),
        "H" | "h" => Some(chrono::Duration::hours(n)),
        "M" | "m" => Some(chrono::Duration::minutes(n)),
        "S" | "s" => Some(chrono::Duration::seconds(n)),
        _ => None,
    }
}

/// Slice-availability polling policy.
#[derive(Debug, Clone, Copy)]
pub struct Polling {
    pub enabled: bool,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Polling {
    fn default() -> Self {
        Polling {
            enabled: false,
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Polling {
    fn parse(value: &Value) -> Result<Polling> {
        match value {
            Value::Bool(b) => Ok(Polling {
                enabled: *b,
                ..Polling::default()
            }),
            Value::Object(map) => {
                let mut polling = Polling {
                    enabled: true,
                    ..Polling::default()
                };
                if let Some(v) = map.get("interval").and_then(Value::as_f64) {
                    polling.interval = Duration::from_secs_f64(v);
                }
                if let Some(v) = map.get("timeout").and_then(Value::as_f64) {
                    polling.timeout = Duration::from_secs_f64(v);
                }
                Ok(polling)
            }
            other => err_at!(
                Config,
                msg: "slice_polling: expected bool or {{interval, timeout}}, got {}",
                other
            ),
        }
    }
}

/// Per-variable encoding overrides layered onto the cube's derived schema.
#[derive(Debug, Clone, Default)]
pub struct EncodingOverride {
    pub dtype: Option<String>,
    pub chunks: Option<Vec<Option<u64>>>,
    pub fill_value: Option<Value>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub units: Option<String>,
    pub calendar: Option<String>,
    pub compressor: Option<String>,
    pub filters: Option<Vec<String>>,
}

impl From<RawEncoding> for EncodingOverride {
    fn from(raw: RawEncoding) -> Self {
        EncodingOverride {
            dtype: raw.dtype,
            chunks: raw.chunks,
            fill_value: raw.fill_value,
            scale_factor: raw.scale_factor,
            add_offset: raw.add_offset,
            units: raw.units,
            calendar: raw.calendar,
            compressor: raw.compressor,
            filters: raw.filters,
        }
    }
}

/// Per-variable configuration: dimension names (when they can't be inferred
/// from the slice alone), encoding overrides, and literal attributes.
#[derive(Debug, Clone, Default)]
pub struct VariableOverride {
    pub dims: Option<Vec<String>>,
    pub encoding: EncodingOverride,
    pub attrs: Map<String, Value>,
}

impl From<RawVariable> for VariableOverride {
    fn from(raw: RawVariable) -> Self {
        VariableOverride {
            dims: raw.dims,
            encoding: raw.encoding.map(EncodingOverride::from).unwrap_or_default(),
            attrs: raw.attrs.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoggingConfig {
    pub level: log::LevelFilter,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: log::LevelFilter::Info,
        }
    }
}

impl LoggingConfig {
    fn parse(raw: RawLogging) -> Result<LoggingConfig> {
        let level = match raw.level {
            Some(s) => err_at!(Config, s.parse::<log::LevelFilter>(), "logging.level {:?}", s)?,
            None => log::LevelFilter::Info,
        };
        Ok(LoggingConfig { level })
    }
}

/// The validated, immutable configuration for one run of the append engine.
/// Built exclusively through [`Config::load`] or [`TryFrom<RawConfig>`]; no
/// public constructor bypasses validation.
#[derive(Debug, Clone)]
pub struct Config {
    pub target_dir: String,
    pub target_storage_options: HashMap<String, String>,
    pub append_dim: String,
    pub append_step: AppendStep,
    pub fixed_dims: HashMap<String, u64>,
    pub included_variables: Option<Vec<String>>,
    pub excluded_variables: Vec<String>,
    pub variables: HashMap<String, VariableOverride>,
    pub attrs: Map<String, Value>,
    pub attrs_update_mode: AttrsUpdateMode,
    pub permit_eval: bool,
    pub zarr_version: u8,
    pub slice_storage_options: HashMap<String, String>,
    pub slice_engine: Option<String>,
    pub slice_polling: Polling,
    pub slice_source: Option<String>,
    pub slice_source_kwargs: Map<String, Value>,
    pub persist_mem_slices: bool,
    pub temp_dir: String,
    pub temp_storage_options: HashMap<String, String>,
    pub disable_rollback: bool,
    pub force_new: bool,
    pub dry_run: bool,
    pub profiling: bool,
    pub logging: LoggingConfig,
    pub extra: Map<String, Value>,
}

/// Highest-precedence overrides applied on top of any configuration file,
/// typically sourced from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_dir: Option<String>,
    pub force_new: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Overrides {
    /// Fold these overrides into a raw document, CLI-flag fields winning.
    pub fn apply(self, mut raw: RawConfig) -> RawConfig {
        if let Some(t) = self.target_dir {
            raw.target_dir = Some(t);
        }
        if let Some(f) = self.force_new {
            raw.force_new = Some(f);
        }
        if let Some(d) = self.dry_run {
            raw.dry_run = Some(d);
        }
        raw
    }
}

impl Config {
    /// Load, merge, substitute, and validate configuration from one or more
    /// files (later files win at the leaf) plus CLI overrides.
    pub fn load(paths: &[PathBuf], overrides: Overrides) -> Result<Config> {
        if paths.is_empty() {
            return err_at!(Config, msg: "no configuration file supplied");
        }
        let raw = raw::load_merged(paths)?;
        let raw = overrides.apply(raw);
        Config::try_from(raw)
    }

    /// Load configuration already merged in memory, skipping file I/O.
    /// Used by tests and by `--help-config`-adjacent tooling.
    pub fn from_raw(raw: RawConfig) -> Result<Config> {
        Config::try_from(raw)
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = crate::Error;

    fn try_from(raw: RawConfig) -> Result<Config> {
        let target_dir = match raw.target_dir {
            Some(t) if !t.is_empty() => t,
            _ => return err_at!(Config, msg: "target_dir is required"),
        };

        let zarr_version = raw.zarr_version.unwrap_or(2);
        if zarr_version != 2 {
            return err_at!(Config, msg: "zarr_version: only 2 is supported, got {}", zarr_version);
        }

        let attrs_update_mode = match raw.attrs_update_mode {
            Some(s) => AttrsUpdateMode::parse(&s)?,
            None => AttrsUpdateMode::default(),
        };

        let append_step = match raw.append_step {
            Some(v) => AppendStep::parse(&v)?,
            None => AppendStep::default(),
        };

        let slice_polling = match raw.slice_polling {
            Some(v) => Polling::parse(&v)?,
            None => Polling::default(),
        };

        let variables = raw
            .variables
            .unwrap_or_default()
            .into_iter()
            .map(|(name, v)| (name, VariableOverride::from(v)))
            .collect();

        let logging = LoggingConfig::parse(raw.logging.unwrap_or_default())?;

        let temp_dir = raw
            .temp_dir
            .unwrap_or_else(|| std::env::temp_dir().to_string_lossy().into_owned());

        Ok(Config {
            target_dir,
            target_storage_options: raw.target_storage_options.unwrap_or_default(),
            append_dim: raw.append_dim.unwrap_or_else(|| "time".to_string()),
            append_step,
            fixed_dims: raw.fixed_dims.unwrap_or_default(),
            included_variables: raw.included_variables,
            excluded_variables: raw.excluded_variables.unwrap_or_default(),
            variables,
            attrs: raw.attrs.unwrap_or_default(),
            attrs_update_mode,
            permit_eval: raw.permit_eval.unwrap_or(false),
            zarr_version,
            slice_storage_options: raw.slice_storage_options.unwrap_or_default(),
            slice_engine: raw.slice_engine,
            slice_polling,
            slice_source: raw.slice_source,
            slice_source_kwargs: raw.slice_source_kwargs.unwrap_or_default(),
            persist_mem_slices: raw.persist_mem_slices.unwrap_or(false),
            temp_dir,
            temp_storage_options: raw.temp_storage_options.unwrap_or_default(),
            disable_rollback: raw.disable_rollback.unwrap_or(false),
            force_new: raw.force_new.unwrap_or(false),
            dry_run: raw.dry_run.unwrap_or(false),
            profiling: raw.profiling.unwrap_or(false),
            logging,
            extra: raw.extra,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
