use super::*;

#[test]
fn write_then_read_roundtrips() {
    let fs = MemoryFs::isolated();
    fs.write("a/b.bin", b"hello").unwrap();
    assert_eq!(fs.read("a/b.bin").unwrap(), b"hello");
}

#[test]
fn exists_reports_directories_via_prefix() {
    let fs = MemoryFs::isolated();
    fs.write("group/v/0.0", b"chunk").unwrap();
    assert!(fs.exists("group").unwrap());
    assert!(fs.exists("group/v").unwrap());
    assert!(!fs.exists("group/other").unwrap());
}

#[test]
fn remove_dir_all_drops_every_key_under_prefix() {
    let fs = MemoryFs::isolated();
    fs.write("group/v/.zarray", b"{}").unwrap();
    fs.write("group/v/0.0", b"chunk").unwrap();
    fs.write("group/.zattrs", b"{}").unwrap();

    fs.remove_dir_all("group/v").unwrap();

    assert!(!fs.exists("group/v").unwrap());
    assert!(fs.exists("group/.zattrs").unwrap());
}

#[test]
fn rename_moves_value_between_keys() {
    let fs = MemoryFs::isolated();
    fs.write("from.bin", b"payload").unwrap();
    fs.rename("from.bin", "to.bin").unwrap();
    assert!(!fs.exists("from.bin").unwrap());
    assert_eq!(fs.read("to.bin").unwrap(), b"payload");
}

#[test]
fn create_new_fails_on_a_second_call() {
    let fs = MemoryFs::isolated();
    assert!(fs.create_new("t.lock", b"one").unwrap());
    assert!(!fs.create_new("t.lock", b"two").unwrap());
    assert_eq!(fs.read("t.lock").unwrap(), b"one");
}

#[test]
fn shared_handles_with_the_same_name_see_each_others_writes() {
    let a = MemoryFs::shared("cubeward-test-shared");
    let b = MemoryFs::shared("cubeward-test-shared");
    a.write("k", b"v").unwrap();
    assert_eq!(b.read("k").unwrap(), b"v");
}

#[test]
fn list_returns_immediate_children_only() {
    let fs = MemoryFs::isolated();
    fs.write("g/v/.zarray", b"{}").unwrap();
    fs.write("g/v/0.0", b"chunk").unwrap();
    fs.write("g/.zattrs", b"{}").unwrap();

    let listing = fs.list("g").unwrap();
    let mut names: Vec<&str> = listing.iter().map(|e| e.path.rsplit('/').next().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec![".zattrs", "v"]);
}
