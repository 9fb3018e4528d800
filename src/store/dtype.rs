//! Storage data types a variable may declare, and the JSON spelling Zarr v2
//! metadata documents use for them (`"<f8"`, `"|u1"`, ...).

use crate::{err_at, Result};

/// A variable's storage-side dtype, independent of how the value is held in
/// memory (acquisition always normalizes numeric payloads to `f64`; packing
/// and dtype together decide how it is cast back down on write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Dtype {
    pub fn parse(s: &str) -> Result<Dtype> {
        match s {
            "bool" | "|b1" => Ok(Dtype::Bool),
            "i8" | "|i1" => Ok(Dtype::I8),
            "i16" | "<i2" => Ok(Dtype::I16),
            "i32" | "<i4" => Ok(Dtype::I32),
            "i64" | "<i8" => Ok(Dtype::I64),
            "u8" | "|u1" => Ok(Dtype::U8),
            "u16" | "<u2" => Ok(Dtype::U16),
            "u32" | "<u4" => Ok(Dtype::U32),
            "u64" | "<u8" => Ok(Dtype::U64),
            "f32" | "<f4" => Ok(Dtype::F32),
            "f64" | "<f8" => Ok(Dtype::F64),
            other => err_at!(Config, msg: "unrecognised dtype {:?}", other),
        }
    }

    /// Zarr v2 `.zarray` "dtype" spelling, little-endian.
    pub fn zarr_spelling(&self) -> &'static str {
        match self {
            Dtype::Bool => "|b1",
            Dtype::I8 => "|i1",
            Dtype::I16 => "<i2",
            Dtype::I32 => "<i4",
            Dtype::I64 => "<i8",
            Dtype::U8 => "|u1",
            Dtype::U16 => "<u2",
            Dtype::U32 => "<u4",
            Dtype::U64 => "<u8",
            Dtype::F32 => "<f4",
            Dtype::F64 => "<f8",
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            Dtype::Bool | Dtype::I8 | Dtype::U8 => 1,
            Dtype::I16 | Dtype::U16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::U64 | Dtype::F64 => 8,
        }
    }

    /// Pack one `f64` logical value into this dtype's little-endian bytes,
    /// applying `scale`/`offset` if given (`stored = (value - offset) / scale`).
    pub fn pack(&self, value: f64, scale: Option<f64>, offset: Option<f64>) -> Vec<u8> {
        let stored = match (scale, offset) {
            (Some(s), Some(o)) => (value - o) / s,
            (Some(s), None) => value / s,
            (None, Some(o)) => value - o,
            (None, None) => value,
        };
        match self {
            Dtype::Bool => vec![(stored != 0.0) as u8],
            Dtype::I8 => (stored as i8).to_le_bytes().to_vec(),
            Dtype::I16 => (stored as i16).to_le_bytes().to_vec(),
            Dtype::I32 => (stored as i32).to_le_bytes().to_vec(),
            Dtype::I64 => (stored as i64).to_le_bytes().to_vec(),
            Dtype::U8 => (stored as u8).to_le_bytes().to_vec(),
            Dtype::U16 => (stored as u16).to_le_bytes().to_vec(),
            Dtype::U32 => (stored as u32).to_le_bytes().to_vec(),
            Dtype::U64 => (stored as u64).to_le_bytes().to_vec(),
            Dtype::F32 => (stored as f32).to_le_bytes().to_vec(),
            Dtype::F64 => stored.to_le_bytes().to_vec(),
        }
    }

    /// Inverse of [`Dtype::pack`], reading one value at `offset` bytes into
    /// `buf` and unpacking scale/offset back to a logical `f64`.
    pub fn unpack(&self, buf: &[u8], scale: Option<f64>, offset: Option<f64>) -> f64 {
        let stored: f64 = match self {
            Dtype::Bool => buf[0] as f64,
            Dtype::I8 => buf[0] as i8 as f64,
            Dtype::I16 => i16::from_le_bytes([buf[0], buf[1]]) as f64,
            Dtype::I32 => i32::from_le_bytes(buf[0..4].try_into().unwrap()) as f64,
            Dtype::I64 => i64::from_le_bytes(buf[0..8].try_into().unwrap()) as f64,
            Dtype::U8 => buf[0] as f64,
            Dtype::U16 => u16::from_le_bytes([buf[0], buf[1]]) as f64,
            Dtype::U32 => u32::from_le_bytes(buf[0..4].try_into().unwrap()) as f64,
            Dtype::U64 => u64::from_le_bytes(buf[0..8].try_into().unwrap()) as f64,
            Dtype::F32 => f32::from_le_bytes(buf[0..4].try_into().unwrap()) as f64,
            Dtype::F64 => f64::from_le_bytes(buf[0..8].try_into().unwrap()),
        };
        match (scale, offset) {
            (Some(s), Some(o)) => stored * s + o,
            (Some(s), None) => stored * s,
            (None, Some(o)) => stored + o,
            (None, None) => stored,
        }
    }
}

#[cfg(test)]
#[path = "dtype_test.rs"]
mod dtype_test;
