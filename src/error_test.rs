use super::*;

#[test]
fn display_includes_kind_and_message() {
    let err = Error::new(Kind::SliceShape, "t axis 2 != chunk 1".to_string(), "x.rs:1");
    let s = err.to_string();
    assert!(s.contains("SliceShapeError"));
    assert!(s.contains("t axis 2 != chunk 1"));
}

#[test]
fn notes_are_appended_not_replacing_root_cause() {
    let err = Error::new(Kind::Io, "disk full".to_string(), "x.rs:1")
        .with_note("rollback of chunk-3 also failed: disk full");
    assert!(err.is_kind(Kind::Io));
    assert_eq!(err.notes().len(), 1);
    let s = err.to_string();
    assert!(s.starts_with("IoError"));
    assert!(s.contains("note: rollback of chunk-3"));
}

#[test]
fn err_at_wraps_io_result() {
    fn fails() -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"))
    }
    let res: Result<()> = err_at!(Io, fails());
    let err = res.unwrap_err();
    assert!(err.is_kind(Kind::Io));
}

#[test]
fn err_at_msg_form_constructs_directly() {
    let res: std::result::Result<(), Error> = err_at!(Internal, msg: "bad state {}", 42);
    let err = res.unwrap_err();
    assert!(err.is_kind(Kind::Internal));
    assert!(err.to_string().contains("bad state 42"));
}
