// Delegated general-purpose codec: zlib streams through flate2.

use crate::error::{Error, Result};
use crate::method::Codec;
use flate2::{Compression, Decompress, FlushDecompress, Status, write::ZlibEncoder};
use std::io::Write;
use tracing::debug;

pub const MAX_LEVEL: u32 = 9;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateCodec;

impl Codec for DeflateCodec {
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>> {
        compress(data, level)
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        decompress(payload)
    }
}

pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    if level > MAX_LEVEL {
        return Err(Error::InvalidLevel(level));
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;
    debug!(
        input_len = data.len(),
        output_len = compressed.len(),
        level,
        "deflate compressed"
    );
    Ok(compressed)
}

pub fn decompress(payload: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut decompressed = Vec::with_capacity(payload.len().saturating_mul(2).max(64));
    loop {
        if decompressed.len() == decompressed.capacity() {
            decompressed.reserve(decompressed.capacity());
        }
        let consumed = inflater.total_in() as usize;
        let produced = decompressed.len();
        let status = inflater
            .decompress_vec(&payload[consumed..], &mut decompressed, FlushDecompress::None)
            .map_err(|e| Error::corrupt(format!("zlib stream: {e}")))?;
        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() as usize == consumed
                    && decompressed.len() == produced;
                if stalled {
                    return Err(Error::corrupt("zlib stream is truncated"));
                }
            }
        }
    }

    let trailing = payload.len() - inflater.total_in() as usize;
    if trailing > 0 {
        return Err(Error::corrupt(format!(
            "{trailing} trailing bytes after zlib stream"
        )));
    }
    if decompressed.is_empty() {
        // Never produced by `compress`, which refuses empty input.
        return Err(Error::EmptyInput);
    }
    debug!(output_len = decompressed.len(), "deflate decompressed");
    Ok(decompressed)
}
