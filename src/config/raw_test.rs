use super::*;
use serde_json::json;

#[test]
fn merge_values_deep_merges_objects_and_replaces_scalars() {
    let mut base = json!({
        "target_dir": "/a",
        "fixed_dims": {"x": 10, "y": 20},
    });
    let overlay = json!({
        "target_dir": "/b",
        "fixed_dims": {"y": 99, "z": 5},
    });
    merge_values(&mut base, overlay);
    assert_eq!(base["target_dir"], "/b");
    assert_eq!(base["fixed_dims"]["x"], 10);
    assert_eq!(base["fixed_dims"]["y"], 99);
    assert_eq!(base["fixed_dims"]["z"], 5);
}

#[test]
fn merge_values_replaces_arrays_wholesale() {
    let mut base = json!({"excluded_variables": ["a", "b"]});
    let overlay = json!({"excluded_variables": ["c"]});
    merge_values(&mut base, overlay);
    assert_eq!(base["excluded_variables"], json!(["c"]));
}

#[test]
fn substitute_env_walks_nested_string_leaves() {
    std::env::set_var("CUBEWARD_TEST_ROOT", "/tmp/cube");
    let mut value = json!({
        "target_dir": "${CUBEWARD_TEST_ROOT}/out.zarr",
        "nested": {"a": ["$CUBEWARD_TEST_ROOT/x"]},
    });
    substitute_env(&mut value).unwrap();
    assert_eq!(value["target_dir"], "/tmp/cube/out.zarr");
    assert_eq!(value["nested"]["a"][0], "/tmp/cube/x");
}

#[test]
fn load_merged_reads_toml_and_json_and_later_file_wins() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("base.toml");
    std::fs::write(&toml_path, "target_dir = \"/base\"\nappend_dim = \"time\"\n").unwrap();
    let json_path = dir.path().join("override.json");
    std::fs::write(&json_path, r#"{"target_dir": "/override"}"#).unwrap();

    let raw = load_merged(&[toml_path, json_path]).unwrap();
    assert_eq!(raw.target_dir.as_deref(), Some("/override"));
    assert_eq!(raw.append_dim.as_deref(), Some("time"));
}

#[test]
fn unknown_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "target_dir = \"/a\"\nnot_a_real_field = 1\n").unwrap();
    let err = load_merged(&[path]).unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}
