use super::*;
use crate::fsys::MemoryFs;

fn meta_2x3_chunked_on_axis0() -> ArrayMeta {
    ArrayMeta {
        shape: vec![4, 3],
        chunks: vec![1, 3],
        dtype: Dtype::F64,
        fill_value: -1.0,
        scale_factor: None,
        add_offset: None,
        compressor: Compressor::None,
        filters: Vec::new(),
    }
}

#[test]
fn chunk_grid_rounds_up() {
    let meta = meta_2x3_chunked_on_axis0();
    assert_eq!(chunk_grid(&meta), vec![4, 1]);
}

#[test]
fn write_then_read_roundtrips_full_array() {
    let fs = MemoryFs::isolated();
    let meta = meta_2x3_chunked_on_axis0();
    let data: Vec<f64> = (0..12).map(|i| i as f64).collect();

    let writes = chunk_writes(&data, "t.cube", "v", &meta, 0, 0..4).unwrap();
    assert_eq!(writes.len(), 4);
    for w in &writes {
        fs.write(&w.path, w.bytes.as_ref().unwrap()).unwrap();
    }

    let back = read_array(&fs, "t.cube", "v", &meta).unwrap();
    assert_eq!(back, data);
}

#[test]
fn missing_chunk_reads_back_as_fill_value() {
    let fs = MemoryFs::isolated();
    let meta = meta_2x3_chunked_on_axis0();
    let back = read_array(&fs, "t.cube", "v", &meta).unwrap();
    assert_eq!(back, vec![-1.0; 12]);
}

#[test]
fn all_fill_block_is_not_written() {
    let meta = meta_2x3_chunked_on_axis0();
    let data = vec![-1.0; 12];
    let writes = chunk_writes(&data, "t.cube", "v", &meta, 0, 0..4).unwrap();
    assert!(writes.iter().all(|w| w.bytes.is_none()));
}

#[test]
fn chunk_writes_restricts_to_index_range() {
    let meta = meta_2x3_chunked_on_axis0();
    let data: Vec<f64> = (0..12).map(|i| i as f64).collect();
    let writes = chunk_writes(&data, "t.cube", "v", &meta, 0, 2..3).unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "t.cube/v/2.0");
}

#[test]
fn chunk_writes_offset_translates_local_grid_into_global_chunk_numbers() {
    // One append step's slab: a single chunk's worth of data along axis 0,
    // the variable's full width along axis 1.
    let local_meta = ArrayMeta {
        shape: vec![1, 3],
        chunks: vec![1, 3],
        ..meta_2x3_chunked_on_axis0()
    };
    let data = vec![7.0, 8.0, 9.0];
    let writes = chunk_writes_offset(&data, "t.cube", "v", &local_meta, 0, 3).unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "t.cube/v/3.0");
    assert_eq!(
        decode_chunk(&local_meta, writes[0].bytes.clone().unwrap(), 3).unwrap(),
        data
    );
}
