use super::*;
use crate::fsys::MemoryFs;
use crate::store::{self, ArrayMeta, Compressor, Dtype};

fn write_variable(fs: &MemoryFs, base: &str, name: &str, dims: &[&str], shape: Vec<u64>, chunks: Vec<u64>) {
    let meta = ArrayMeta {
        shape,
        chunks,
        dtype: Dtype::F64,
        fill_value: 0.0,
        scale_factor: None,
        add_offset: None,
        compressor: Compressor::None,
        filters: Vec::new(),
    };
    fs.write(&store::array_meta_path(base, name), meta.to_json().to_string().as_bytes()).unwrap();
    let attrs = serde_json::json!({ "_ARRAY_DIMENSIONS": dims });
    fs.write(&store::array_attrs_path(base, name), attrs.to_string().as_bytes()).unwrap();
}

#[test]
fn reads_append_length_and_chunk_from_existing_variables() {
    let fs = MemoryFs::isolated();
    write_variable(&fs, "t.cube", "t", &["t"], vec![2], vec![1]);
    write_variable(&fs, "t.cube", "v", &["t", "x"], vec![2, 4], vec![1, 4]);

    let state = read_cube_state(&fs, "t.cube", "t").unwrap();
    assert_eq!(state.append_length, 2);
    assert_eq!(state.schema.append_chunk, 1);
    assert_eq!(state.schema.fixed_dims["x"], 4);
}

#[test]
fn disagreeing_append_lengths_across_variables_is_internal_error() {
    let fs = MemoryFs::isolated();
    write_variable(&fs, "t.cube", "t", &["t"], vec![2], vec![1]);
    write_variable(&fs, "t.cube", "v", &["t", "x"], vec![3, 4], vec![1, 4]);

    let err = read_cube_state(&fs, "t.cube", "t").unwrap_err();
    assert!(err.is_kind(crate::Kind::Internal));
}
