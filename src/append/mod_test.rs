use ndarray::ArrayD;

use super::*;
use crate::config::raw::RawConfig;
use crate::fsys::MemoryFs;
use crate::slice::Variable;
use crate::store::Dtype;

fn config(append_dim: &str) -> Config {
    Config::from_raw(RawConfig {
        target_dir: Some("t.cube".to_string()),
        append_dim: Some(append_dim.to_string()),
        ..RawConfig::default()
    })
    .unwrap()
}

fn slice(time: Vec<f64>, v: Vec<f64>) -> Dataset {
    let n = time.len();
    let mut ds = Dataset::new();
    ds.variables.insert(
        "time".to_string(),
        Variable {
            dims: vec!["time".to_string()],
            dtype: Dtype::F64,
            data: ArrayD::from_shape_vec(vec![n], time).unwrap(),
            attrs: Default::default(),
        },
    );
    ds.variables.insert(
        "v".to_string(),
        Variable {
            dims: vec!["time".to_string(), "x".to_string()],
            dtype: Dtype::F64,
            data: ArrayD::from_shape_vec(vec![n, 3], v).unwrap(),
            attrs: Default::default(),
        },
    );
    ds
}

#[test]
fn create_path_materializes_cube_and_coordinate() {
    let fs = MemoryFs::isolated();
    let cfg = config("time");
    let s0 = slice(vec![0.0], vec![1.0, 2.0, 3.0]);

    let outcome = run(&fs, "t.cube", "/tmp", &cfg, s0).unwrap();
    assert_eq!(outcome, Outcome::Created);
    assert!(fs.exists("t.cube/.zgroup").unwrap());

    let view = slice::read_dataset(&fs, "t.cube").unwrap();
    let time = view.variables.get("time").unwrap();
    assert_eq!(time.data.iter().copied().collect::<Vec<_>>(), vec![0.0]);
    let v = view.variables.get("v").unwrap();
    assert_eq!(v.data.shape(), &[1, 3]);
}

#[test]
fn append_path_grows_the_append_axis_and_concatenates_coordinates() {
    let fs = MemoryFs::isolated();
    let cfg = config("time");
    run(&fs, "t.cube", "/tmp", &cfg, slice(vec![0.0], vec![1.0, 2.0, 3.0])).unwrap();

    let outcome = run(&fs, "t.cube", "/tmp", &cfg, slice(vec![1.0], vec![4.0, 5.0, 6.0])).unwrap();
    assert_eq!(outcome, Outcome::Appended);

    let view = slice::read_dataset(&fs, "t.cube").unwrap();
    let time = view.variables.get("time").unwrap();
    assert_eq!(time.data.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0]);
    let v = view.variables.get("v").unwrap();
    assert_eq!(v.data.shape(), &[2, 3]);
    assert_eq!(v.data.iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn shape_mismatch_fails_and_leaves_cube_untouched() {
    let fs = MemoryFs::isolated();
    let cfg = config("time");
    run(&fs, "t.cube", "/tmp", &cfg, slice(vec![0.0], vec![1.0, 2.0, 3.0])).unwrap();

    let bad = slice(vec![1.0, 2.0], vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let err = run(&fs, "t.cube", "/tmp", &cfg, bad).unwrap_err();
    assert!(err.is_kind(crate::Kind::SliceShape));

    let view = slice::read_dataset(&fs, "t.cube").unwrap();
    let time = view.variables.get("time").unwrap();
    assert_eq!(time.data.iter().copied().collect::<Vec<_>>(), vec![0.0]);
}

#[test]
fn append_step_violation_is_rejected() {
    let fs = MemoryFs::isolated();
    let mut raw = RawConfig {
        target_dir: Some("t.cube".to_string()),
        append_dim: Some("time".to_string()),
        ..RawConfig::default()
    };
    raw.append_step = Some(serde_json::json!("+"));
    let cfg = Config::from_raw(raw).unwrap();

    run(&fs, "t.cube", "/tmp", &cfg, slice(vec![5.0], vec![1.0, 2.0, 3.0])).unwrap();
    let err = run(&fs, "t.cube", "/tmp", &cfg, slice(vec![3.0], vec![4.0, 5.0, 6.0])).unwrap_err();
    assert!(err.is_kind(crate::Kind::AppendOrder));
}

#[test]
fn permit_eval_resolves_bound_expressions_into_group_attrs() {
    let fs = MemoryFs::isolated();
    let mut raw = RawConfig {
        target_dir: Some("t.cube".to_string()),
        append_dim: Some("time".to_string()),
        ..RawConfig::default()
    };
    raw.permit_eval = Some(true);
    let mut attrs = serde_json::Map::new();
    attrs.insert("time_coverage_start".to_string(), serde_json::json!(r#"{{ lower_bound(time, "lower") }}"#));
    raw.attrs = Some(attrs);
    let cfg = Config::from_raw(raw).unwrap();

    run(&fs, "t.cube", "/tmp", &cfg, slice(vec![0.0, 1.0], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).unwrap();

    let group_attrs = store::read_attrs(&fs, &store::group_attrs_path("t.cube")).unwrap();
    assert_eq!(group_attrs["time_coverage_start"], serde_json::json!("0"));
}

#[test]
fn rerunning_against_an_absent_target_creates_a_fresh_cube() {
    let fs = MemoryFs::isolated();
    let cfg = config("time");
    run(&fs, "t.cube", "/tmp", &cfg, slice(vec![0.0], vec![1.0, 2.0, 3.0])).unwrap();
    fs.remove_dir_all("t.cube").unwrap();

    let outcome = run(&fs, "t.cube", "/tmp", &cfg, slice(vec![9.0], vec![1.0, 2.0, 3.0])).unwrap();
    assert_eq!(outcome, Outcome::Created);
    let view = slice::read_dataset(&fs, "t.cube").unwrap();
    assert_eq!(view.variables.get("time").unwrap().data.iter().copied().collect::<Vec<_>>(), vec![9.0]);
}
