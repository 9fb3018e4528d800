use std::sync::Arc;

use super::*;
use crate::fsys::{Filesystem, LocalFs};

fn local() -> Arc<dyn Filesystem> {
    Arc::new(LocalFs)
}

#[test]
fn path_for_appends_lock_suffix_as_sibling() {
    assert_eq!(Lock::path_for("/data/t.cube"), "/data/t.cube.lock");
}

#[test]
fn path_for_bare_filename_still_yields_sibling() {
    assert_eq!(Lock::path_for("t.cube"), "t.cube.lock");
}

#[test]
fn acquire_then_release_leaves_no_lock_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("t.cube");
    let target = target.to_str().unwrap();
    let fs = local();
    let lock = Lock::acquire(fs.clone(), target, WaitPolicy::FailFast).unwrap();
    let lock_path = lock.path().to_string();
    assert!(fs.exists(&lock_path).unwrap());
    lock.release().unwrap();
    assert!(!fs.exists(&lock_path).unwrap());
}

#[test]
fn second_fail_fast_acquire_is_target_locked() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("t.cube");
    let target = target.to_str().unwrap();
    let fs = local();
    let _lock = Lock::acquire(fs.clone(), target, WaitPolicy::FailFast).unwrap();
    let err = Lock::acquire(fs, target, WaitPolicy::FailFast).unwrap_err();
    assert!(err.is_kind(crate::Kind::TargetLocked));
}

#[test]
fn wait_policy_times_out_as_target_locked() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("t.cube");
    let target = target.to_str().unwrap();
    let fs = local();
    let _lock = Lock::acquire(fs.clone(), target, WaitPolicy::FailFast).unwrap();
    let policy = WaitPolicy::Wait {
        interval: Duration::from_millis(5),
        timeout: Duration::from_millis(30),
    };
    let err = Lock::acquire(fs, target, policy).unwrap_err();
    assert!(err.is_kind(crate::Kind::TargetLocked));
}

#[test]
fn missing_parent_directory_fails_fast_with_config_error() {
    let err = Lock::acquire(local(), "/no/such/parent/t.cube", WaitPolicy::FailFast).unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}

#[test]
fn drop_without_explicit_release_still_removes_lease_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("t.cube");
    let target = target.to_str().unwrap();
    let fs = local();
    let lock_path;
    {
        let lock = Lock::acquire(fs.clone(), target, WaitPolicy::FailFast).unwrap();
        lock_path = lock.path().to_string();
    }
    assert!(!fs.exists(&lock_path).unwrap());
}
