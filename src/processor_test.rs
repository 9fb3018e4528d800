use ndarray::ArrayD;

use super::*;
use crate::config::raw::RawConfig;
use crate::slice::Variable;
use crate::store::Dtype;

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

fn config(target_dir: &std::path::Path, temp_dir: &std::path::Path) -> Config {
    Config::from_raw(RawConfig {
        target_dir: Some(target_dir.to_string_lossy().into_owned()),
        temp_dir: Some(temp_dir.to_string_lossy().into_owned()),
        append_dim: Some("time".to_string()),
        ..RawConfig::default()
    })
    .unwrap()
}

#[test]
fn process_creates_then_appends_across_two_slices() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(&root.path().join("cube"), &root.path().join("tmp"));

    let outcomes = process(
        vec![
            SliceHandle::Memory(slice(vec![0.0], vec![1.0, 2.0, 3.0])),
            SliceHandle::Memory(slice(vec![1.0], vec![4.0, 5.0, 6.0])),
        ],
        cfg,
    )
    .unwrap();

    assert_eq!(outcomes, vec![Outcome::Created, Outcome::Appended]);
    assert!(root.path().join("cube").join(".zgroup").exists());
    assert!(!root.path().join("cube.lock").exists());
}

#[test]
fn cancelling_up_front_stops_the_run_before_any_slice_lands() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(&root.path().join("cube"), &root.path().join("tmp"));

    let processor = Processor::new(cfg);
    processor.cancellation().cancel();

    let err = processor
        .run(vec![SliceHandle::Memory(slice(vec![0.0], vec![1.0, 2.0, 3.0]))])
        .unwrap_err();

    assert!(err.is_kind(crate::Kind::Cancelled));
    assert!(!root.path().join("cube").exists());
}

#[test]
fn force_new_deletes_an_existing_cube_before_recreating_it() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("cube");
    let temp = root.path().join("tmp");

    process(
        vec![SliceHandle::Memory(slice(vec![0.0], vec![1.0, 2.0, 3.0]))],
        config(&target, &temp),
    )
    .unwrap();

    let mut raw = RawConfig {
        target_dir: Some(target.to_string_lossy().into_owned()),
        temp_dir: Some(temp.to_string_lossy().into_owned()),
        append_dim: Some("time".to_string()),
        ..RawConfig::default()
    };
    raw.force_new = Some(true);
    let cfg = Config::from_raw(raw).unwrap();

    let outcomes = process(
        vec![SliceHandle::Memory(slice(vec![9.0], vec![7.0, 8.0, 9.0]))],
        cfg,
    )
    .unwrap();

    assert_eq!(outcomes, vec![Outcome::Created]);
    let view = slice::read_dataset(&crate::fsys::LocalFs, &target.to_string_lossy()).unwrap();
    assert_eq!(
        view.variables.get("time").unwrap().data.iter().copied().collect::<Vec<_>>(),
        vec![9.0]
    );
}

#[test]
fn a_live_lock_is_rejected_without_force_new() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("cube");
    let temp = root.path().join("tmp");
    std::fs::create_dir_all(root.path()).unwrap();

    let held = Lock::acquire(
        std::sync::Arc::new(crate::fsys::LocalFs),
        target.to_str().unwrap(),
        WaitPolicy::FailFast,
    )
    .unwrap();

    let cfg = config(&target, &temp);
    let err = process(vec![SliceHandle::Memory(slice(vec![0.0], vec![1.0, 2.0, 3.0]))], cfg).unwrap_err();
    assert!(err.is_kind(crate::Kind::TargetLocked));

    held.release().unwrap();
}

#[test]
fn persist_mem_slices_round_trips_through_temp_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let temp = root.path().join("tmp");
    let mut raw = RawConfig {
        target_dir: Some(root.path().join("cube").to_string_lossy().into_owned()),
        temp_dir: Some(temp.to_string_lossy().into_owned()),
        append_dim: Some("time".to_string()),
        ..RawConfig::default()
    };
    raw.persist_mem_slices = Some(true);
    let cfg = Config::from_raw(raw).unwrap();

    let outcomes = process(
        vec![SliceHandle::Memory(slice(vec![0.0], vec![1.0, 2.0, 3.0]))],
        cfg,
    )
    .unwrap();

    assert_eq!(outcomes, vec![Outcome::Created]);
    assert!(std::fs::read_dir(&temp).unwrap().next().is_none());
}

#[test]
fn dry_run_skips_the_lock_and_leaves_the_target_untouched() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("cube");
    let temp = root.path().join("tmp");
    let mut raw = RawConfig {
        target_dir: Some(target.to_string_lossy().into_owned()),
        temp_dir: Some(temp.to_string_lossy().into_owned()),
        append_dim: Some("time".to_string()),
        ..RawConfig::default()
    };
    raw.dry_run = Some(true);
    let cfg = Config::from_raw(raw).unwrap();

    let outcomes = process(
        vec![SliceHandle::Memory(slice(vec![0.0], vec![1.0, 2.0, 3.0]))],
        cfg,
    )
    .unwrap();

    assert_eq!(outcomes, vec![Outcome::Created]);
    assert!(!target.exists());
    assert!(!std::path::Path::new(&Lock::path_for(target.to_str().unwrap())).exists());
}
