//! Method tags and the dispatching front door.
//!
//! Every container starts with one tag byte naming the codec that produced
//! it. Decompression routes on that byte alone and never sniffs the payload.

use crate::deflate::DeflateCodec;
use crate::error::{Error, Result};
use crate::huffman::{HuffmanCodec, Packed};
use crate::tree::CodeTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A byte-stream codec that can sit behind a method tag.
pub trait Codec {
    /// Compress `data`; the returned payload excludes the method tag.
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>>;

    /// Decompress a payload that followed this codec's method tag.
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Registered codecs. The discriminant is the tag byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Method {
    Huffman = 0,
    Deflate = 1,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::Huffman, Method::Deflate];

    pub fn tag(self) -> u8 {
        self as u8
    }

    fn codec(self) -> &'static dyn Codec {
        match self {
            Method::Huffman => &HuffmanCodec,
            Method::Deflate => &DeflateCodec,
        }
    }
}

impl TryFrom<u8> for Method {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.tag() == tag)
            .ok_or(Error::UnsupportedMethod(tag))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Huffman => f.write_str("huffman"),
            Method::Deflate => f.write_str("deflate"),
        }
    }
}

/// Compression settings. Defaults to deflate at level 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    pub method: Method,
    /// 0 (store) to 9 (best). Ignored by the Huffman codec but still checked.
    pub level: u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            method: Method::Deflate,
            level: crate::deflate::MAX_LEVEL,
        }
    }
}

impl CompressOptions {
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        compress(data, self.method, self.level)
    }
}

/// Compresses `data` with `method` and prefixes the method tag.
pub fn compress(data: &[u8], method: Method, level: u32) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    if level > crate::deflate::MAX_LEVEL {
        return Err(Error::InvalidLevel(level));
    }
    let payload = method.codec().compress(data, level)?;
    let mut container = Vec::with_capacity(1 + payload.len());
    container.push(method.tag());
    container.extend_from_slice(&payload);
    debug!(%method, level, input_len = data.len(), output_len = container.len(), "compressed");
    Ok(container)
}

/// Reads the method tag and hands the rest to the matching codec.
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    let (&tag, payload) = container.split_first().ok_or(Error::EmptyInput)?;
    let method = Method::try_from(tag)?;
    debug!(%method, input_len = container.len(), "decompressing");
    method.codec().decompress(payload)
}

/// Header-level description of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub method: Method,
    pub container_len: usize,
    pub payload_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub huffman: Option<HuffmanInfo>,
}

/// Prefix-coding specifics, read from the header without decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HuffmanInfo {
    pub symbols: usize,
    pub original_len: u64,
    pub table_len: usize,
    pub padding_bits: u8,
    pub packed_len: usize,
    pub code_bits: u64,
    pub max_code_len: usize,
}

/// Describes `container` from its headers. Delegated payloads are opaque.
pub fn inspect(container: &[u8]) -> Result<ContainerInfo> {
    let (&tag, payload) = container.split_first().ok_or(Error::EmptyInput)?;
    let method = Method::try_from(tag)?;
    let huffman = match method {
        Method::Huffman => {
            let packed = Packed::parse(payload)?;
            let codes = CodeTable::from_frequencies(&packed.table)?;
            Some(HuffmanInfo {
                symbols: packed.table.len(),
                original_len: packed.table.total(),
                table_len: packed.table.to_bytes().len(),
                padding_bits: packed.padding,
                packed_len: packed.bits.len(),
                code_bits: packed.bit_len(),
                max_code_len: usize::from(codes.max_len()),
            })
        }
        Method::Deflate => None,
    };
    Ok(ContainerInfo {
        method,
        container_len: container.len(),
        payload_len: payload.len(),
        huffman,
    })
}
