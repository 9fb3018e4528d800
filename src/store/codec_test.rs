use super::*;

#[test]
fn none_roundtrips_unchanged() {
    let c = Compressor::None;
    let raw = vec![1u8, 2, 3, 4];
    let encoded = c.encode(raw.clone()).unwrap();
    assert_eq!(encoded, raw);
    let decoded = c.decode(encoded, raw.len()).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn gzip_roundtrips() {
    let c = Compressor::Gzip { level: 5 };
    let raw = vec![7u8; 256];
    let encoded = c.encode(raw.clone()).unwrap();
    let decoded = c.decode(encoded, raw.len()).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn parse_rejects_unknown_compressor() {
    let err = Compressor::parse("brotli").unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}
