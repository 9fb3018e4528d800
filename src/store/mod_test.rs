use super::*;

fn sample_meta() -> ArrayMeta {
    ArrayMeta {
        shape: vec![2, 4, 4],
        chunks: vec![1, 4, 4],
        dtype: Dtype::F32,
        fill_value: 0.0,
        scale_factor: None,
        add_offset: None,
        compressor: Compressor::None,
        filters: Vec::new(),
    }
}

#[test]
fn array_meta_json_roundtrips() {
    let meta = sample_meta();
    let json = meta.to_json();
    let back = ArrayMeta::from_json(&json).unwrap();
    assert_eq!(back.shape, meta.shape);
    assert_eq!(back.chunks, meta.chunks);
    assert_eq!(back.dtype, meta.dtype);
}

#[test]
fn chunk_path_joins_indices_with_dots() {
    assert_eq!(chunk_path("t.cube", "v", &[1, 0, 0]), "t.cube/v/1.0.0");
}

#[test]
fn encode_decode_chunk_roundtrips() {
    let meta = sample_meta();
    let values = vec![1.0, 2.0, 3.0, 4.0];
    let encoded = encode_chunk(&meta, &values).unwrap();
    let decoded = decode_chunk(&meta, encoded, values.len()).unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn all_fill_chunk_is_detected() {
    assert!(is_all_fill(&[0.0, 0.0, 0.0], 0.0));
    assert!(!is_all_fill(&[0.0, 1.0], 0.0));
}
