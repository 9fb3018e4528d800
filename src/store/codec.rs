//! Bytes-to-bytes compression for chunk payloads, delegated to `zarrs`'s
//! codec implementations. This crate never implements a compression
//! algorithm itself — it only chooses which codec to invoke and in what
//! order, matching the "drives but does not implement" boundary the
//! chunked-array engine collaborator is specified with.

use zarrs::array::{
    codec::{
        bytes_to_bytes::gzip::{GzipCodec, GzipCompressionLevel},
        bytes_to_bytes::zstd::{ZstdCodec, ZstdCompressionLevel},
        BytesToBytesCodecTraits, CodecOptions,
    },
    BytesRepresentation,
};

use crate::{err_at, Result};

/// A variable's compressor, named the way `.zarray` documents spell it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compressor {
    None,
    Gzip { level: u8 },
    Zstd { level: i32 },
}

impl Default for Compressor {
    fn default() -> Self {
        Compressor::None
    }
}

impl Compressor {
    pub fn parse(name: &str) -> Result<Compressor> {
        match name {
            "none" | "" => Ok(Compressor::None),
            "gzip" => Ok(Compressor::Gzip { level: 5 }),
            "zstd" => Ok(Compressor::Zstd { level: 3 }),
            other => err_at!(Config, msg: "compressor: unrecognised codec {:?}", other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compressor::None => "none",
            Compressor::Gzip { .. } => "gzip",
            Compressor::Zstd { .. } => "zstd",
        }
    }

    pub fn encode(&self, raw: Vec<u8>) -> Result<Vec<u8>> {
        let options = CodecOptions::default();
        match self {
            Compressor::None => Ok(raw),
            Compressor::Gzip { level } => {
                let level = err_at!(Config, GzipCompressionLevel::try_from(u32::from(*level)), "gzip compression level {}", level)?;
                let codec = GzipCodec::new(level);
                err_at!(Internal, codec.encode(raw.into(), &options), "gzip encode").map(|b| b.to_vec())
            }
            Compressor::Zstd { level } => {
                let level = err_at!(Config, ZstdCompressionLevel::try_from(*level), "zstd compression level {}", level)?;
                let codec = ZstdCodec::new(level, false);
                err_at!(Internal, codec.encode(raw.into(), &options), "zstd encode").map(|b| b.to_vec())
            }
        }
    }

    pub fn decode(&self, encoded: Vec<u8>, decoded_len: usize) -> Result<Vec<u8>> {
        let options = CodecOptions::default();
        let decoded_representation = BytesRepresentation::FixedSize(decoded_len as u64);
        match self {
            Compressor::None => Ok(encoded),
            Compressor::Gzip { level } => {
                let level = err_at!(Config, GzipCompressionLevel::try_from(u32::from(*level)), "gzip compression level {}", level)?;
                let codec = GzipCodec::new(level);
                err_at!(Internal, codec.decode(encoded.into(), &decoded_representation, &options), "gzip decode")
                    .map(|b| b.to_vec())
            }
            Compressor::Zstd { level } => {
                let level = err_at!(Config, ZstdCompressionLevel::try_from(*level), "zstd compression level {}", level)?;
                let codec = ZstdCodec::new(level, false);
                err_at!(Internal, codec.decode(encoded.into(), &decoded_representation, &options), "zstd decode")
                    .map(|b| b.to_vec())
            }
        }
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
