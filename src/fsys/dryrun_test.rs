use super::*;
use crate::fsys::MemoryFs;

#[test]
fn write_is_a_no_op_against_the_wrapped_backend() {
    let inner = MemoryFs::isolated();
    let dry = DryRunFs::wrap(&inner);
    dry.write("t.cube/.zgroup", b"{}").unwrap();
    assert!(!inner.exists("t.cube/.zgroup").unwrap());
}

#[test]
fn reads_pass_through_to_the_wrapped_backend() {
    let inner = MemoryFs::isolated();
    inner.write("existing", b"data").unwrap();
    let dry = DryRunFs::wrap(&inner);
    assert_eq!(dry.read("existing").unwrap(), b"data");
    assert!(dry.exists("existing").unwrap());
}

#[test]
fn remove_and_rename_are_no_ops() {
    let inner = MemoryFs::isolated();
    inner.write("a", b"x").unwrap();
    let dry = DryRunFs::wrap(&inner);
    dry.remove_file("a").unwrap();
    dry.rename("a", "b").unwrap();
    assert!(inner.exists("a").unwrap());
    assert!(!inner.exists("b").unwrap());
}
