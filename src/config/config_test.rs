use super::*;
use std::convert::TryFrom;

fn minimal_raw() -> RawConfig {
    RawConfig {
        target_dir: Some("/data/cube.zarr".to_string()),
        ..RawConfig::default()
    }
}

#[test]
fn missing_target_dir_is_a_config_error() {
    let err = Config::try_from(RawConfig::default()).unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}

#[test]
fn minimal_config_gets_documented_defaults() {
    let cfg = Config::try_from(minimal_raw()).unwrap();
    assert_eq!(cfg.append_dim, "time");
    assert_eq!(cfg.append_step, AppendStep::Unconstrained);
    assert_eq!(cfg.attrs_update_mode, AttrsUpdateMode::Replace);
    assert_eq!(cfg.zarr_version, 2);
    assert!(!cfg.force_new);
    assert!(!cfg.dry_run);
}

#[test]
fn rejects_unsupported_zarr_version() {
    let mut raw = minimal_raw();
    raw.zarr_version = Some(3);
    let err = Config::try_from(raw).unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}

#[test]
fn rejects_unknown_attrs_update_mode() {
    let mut raw = minimal_raw();
    raw.attrs_update_mode = Some("merge".to_string());
    let err = Config::try_from(raw).unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}

#[test]
fn append_step_signs_parse() {
    let mut raw = minimal_raw();
    raw.append_step = Some(serde_json::json!("+"));
    let cfg = Config::try_from(raw).unwrap();
    assert_eq!(cfg.append_step, AppendStep::Increasing);
}

#[test]
fn append_step_numeric_delta_parses() {
    let mut raw = minimal_raw();
    raw.append_step = Some(serde_json::json!(3600));
    let cfg = Config::try_from(raw).unwrap();
    assert_eq!(cfg.append_step, AppendStep::Delta(3600.0));
}

#[test]
fn overrides_take_precedence_over_file_values() {
    let mut raw = minimal_raw();
    raw.force_new = Some(false);
    let raw = Overrides {
        target_dir: Some("/other/cube.zarr".to_string()),
        force_new: Some(true),
        dry_run: None,
    }
    .apply(raw);
    let cfg = Config::try_from(raw).unwrap();
    assert_eq!(cfg.target_dir, "/other/cube.zarr");
    assert!(cfg.force_new);
}

#[test]
fn variable_overrides_carry_encoding_and_attrs() {
    let mut raw = minimal_raw();
    let mut vars = std::collections::HashMap::new();
    vars.insert(
        "temperature".to_string(),
        RawVariable {
            dims: Some(vec!["time".to_string(), "lat".to_string()]),
            encoding: Some(RawEncoding {
                dtype: Some("float32".to_string()),
                chunks: Some(vec![Some(24), None]),
                ..RawEncoding::default()
            }),
            attrs: None,
        },
    );
    raw.variables = Some(vars);
    let cfg = Config::try_from(raw).unwrap();
    let v = cfg.variables.get("temperature").unwrap();
    assert_eq!(v.dims.as_deref(), Some(&["time".to_string(), "lat".to_string()][..]));
    assert_eq!(v.encoding.dtype.as_deref(), Some("float32"));
}
