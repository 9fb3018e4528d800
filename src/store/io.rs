//! Reads and writes a whole variable's data across its chunk grid, placing
//! each chunk's flattened values at the right row-major offsets. This is the
//! one place the crate reasons about multi-dimensional chunk geometry; the
//! append engine only ever calls [`read_array`]/[`chunk_writes`].

use super::{chunk_path, decode_chunk, encode_chunk, ArrayMeta};
use crate::fsys::Filesystem;
use crate::{err_at, Result};

/// Row-major strides for `shape`.
fn strides(shape: &[u64]) -> Vec<u64> {
    let mut s = vec![1u64; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        s[i] = s[i + 1] * shape[i + 1];
    }
    s
}

/// Number of chunks needed along each axis.
pub fn chunk_grid(meta: &ArrayMeta) -> Vec<u64> {
    meta.shape
        .iter()
        .zip(&meta.chunks)
        .map(|(&s, &c)| if c == 0 { 0 } else { (s + c - 1) / c })
        .collect()
}

/// Every chunk index tuple in the grid, row-major order.
pub fn chunk_indices(grid: &[u64]) -> Vec<Vec<u64>> {
    let mut out = Vec::new();
    let mut prefix = Vec::with_capacity(grid.len());
    chunk_indices_rec(grid, &mut prefix, &mut out);
    out
}

fn chunk_indices_rec(grid: &[u64], prefix: &mut Vec<u64>, out: &mut Vec<Vec<u64>>) {
    if prefix.len() == grid.len() {
        out.push(prefix.clone());
        return;
    }
    let axis = prefix.len();
    for i in 0..grid[axis] {
        prefix.push(i);
        chunk_indices_rec(grid, prefix, out);
        prefix.pop();
    }
}

/// The actual (possibly partial, at the trailing edge) extent of chunk
/// `idx` along each axis.
fn chunk_extent(meta: &ArrayMeta, idx: &[u64]) -> Vec<u64> {
    idx.iter()
        .zip(&meta.chunks)
        .zip(&meta.shape)
        .map(|((&i, &c), &s)| c.min(s - i * c))
        .collect()
}

/// Walk every element of a chunk in row-major order, invoking `f(local, flat_global)`.
fn walk_chunk(origin: &[u64], extent: &[u64], global_strides: &[u64], mut f: impl FnMut(usize, usize)) {
    let ndim = extent.len();
    if ndim == 0 {
        f(0, 0);
        return;
    }
    let mut local = vec![0u64; ndim];
    let mut k = 0usize;
    loop {
        let mut flat = 0u64;
        for d in 0..ndim {
            flat += (origin[d] + local[d]) * global_strides[d];
        }
        f(k, flat as usize);
        k += 1;

        let mut d = ndim;
        loop {
            if d == 0 {
                return;
            }
            d -= 1;
            local[d] += 1;
            if local[d] < extent[d] {
                break;
            }
            local[d] = 0;
            if d == 0 {
                return;
            }
        }
    }
}

/// Read a variable's full data back into one row-major `Vec<f64>`. A chunk
/// file absent on disk is treated as the fill value (sparse store, §4.6).
pub fn read_array(fs: &dyn Filesystem, base: &str, var: &str, meta: &ArrayMeta) -> Result<Vec<f64>> {
    let total: usize = meta.shape.iter().product::<u64>() as usize;
    let mut out = vec![meta.fill_value; total];
    let global_strides = strides(&meta.shape);
    let grid = chunk_grid(meta);

    for idx in chunk_indices(&grid) {
        let path = chunk_path(base, var, &idx);
        if !fs.exists(&path)? {
            continue;
        }
        let extent = chunk_extent(meta, &idx);
        let count: usize = extent.iter().product::<u64>() as usize;
        let bytes = fs.read(&path)?;
        let values = decode_chunk(meta, bytes, count)?;
        let origin: Vec<u64> = idx.iter().zip(&meta.chunks).map(|(&i, &c)| i * c).collect();
        walk_chunk(&origin, &extent, &global_strides, |k, flat| out[flat] = values[k]);
    }
    Ok(out)
}

/// Extract one chunk's values out of a full row-major array, for writing.
fn extract_block(data: &[f64], shape: &[u64], origin: &[u64], extent: &[u64]) -> Vec<f64> {
    let global_strides = strides(shape);
    let count: usize = extent.iter().product::<u64>() as usize;
    let mut out = vec![0.0; count];
    walk_chunk(origin, extent, &global_strides, |k, flat| out[k] = data[flat]);
    out
}

/// One chunk file this write would produce: its path and encoded bytes, or
/// `None` if the block is all fill value (sparse store, §4.6 — the caller
/// skips writing it and, on APPEND, must not leave a stale chunk behind).
pub struct ChunkWrite {
    pub path: String,
    pub bytes: Option<Vec<u8>>,
}

/// Compute the chunk writes a variable's new data requires, restricted to
/// chunk indices whose range along `axis` falls within `index_range`
/// (half-open, in chunk-index units) — used by the append engine to touch
/// only the newly-written chunks along the append axis rather than the
/// whole variable.
pub fn chunk_writes(
    data: &[f64],
    base: &str,
    var: &str,
    meta: &ArrayMeta,
    axis: usize,
    index_range: std::ops::Range<u64>,
) -> Result<Vec<ChunkWrite>> {
    if axis >= meta.shape.len() {
        return err_at!(Internal, msg: "chunk_writes: axis {} out of range for variable {:?}", axis, var);
    }
    let grid = chunk_grid(meta);
    let mut writes = Vec::new();
    for idx in chunk_indices(&grid) {
        if !index_range.contains(&idx[axis]) {
            continue;
        }
        let extent = chunk_extent(meta, &idx);
        let origin: Vec<u64> = idx.iter().zip(&meta.chunks).map(|(&i, &c)| i * c).collect();
        let values = extract_block(data, &meta.shape, &origin, &extent);
        let path = chunk_path(base, var, &idx);
        let bytes = if super::is_all_fill(&values, meta.fill_value) {
            None
        } else {
            Some(encode_chunk(meta, &values)?)
        };
        writes.push(ChunkWrite { path, bytes });
    }
    Ok(writes)
}

/// Compute the chunk writes one append step's data requires. Unlike
/// [`chunk_writes`], `data` and `local_meta` describe only the new slab
/// being appended — one chunk's extent along `axis`, the variable's full
/// extent along every other axis — rather than the whole variable; the
/// append engine never materializes the cube's existing data just to place
/// new chunks. `chunk_offset` is added to the append axis's chunk index
/// when naming each chunk file, translating the slab's own zero-based
/// local grid into the cube's global chunk numbering.
pub fn chunk_writes_offset(
    data: &[f64],
    base: &str,
    var: &str,
    local_meta: &ArrayMeta,
    axis: usize,
    chunk_offset: u64,
) -> Result<Vec<ChunkWrite>> {
    if axis >= local_meta.shape.len() {
        return err_at!(Internal, msg: "chunk_writes_offset: axis {} out of range for variable {:?}", axis, var);
    }
    let grid = chunk_grid(local_meta);
    let mut writes = Vec::new();
    for mut idx in chunk_indices(&grid) {
        let extent = chunk_extent(local_meta, &idx);
        let origin: Vec<u64> = idx.iter().zip(&local_meta.chunks).map(|(&i, &c)| i * c).collect();
        let values = extract_block(data, &local_meta.shape, &origin, &extent);
        idx[axis] += chunk_offset;
        let path = chunk_path(base, var, &idx);
        let bytes = if super::is_all_fill(&values, local_meta.fill_value) {
            None
        } else {
            Some(encode_chunk(local_meta, &values)?)
        };
        writes.push(ChunkWrite { path, bytes });
    }
    Ok(writes)
}

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;
