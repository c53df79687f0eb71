//! Prefix-coding (Huffman) container codec.
//!
//! Payload layout, following the method tag:
//!
//! ```text
//! [u32 BE table length][frequency table][u8 padding bits][packed code bits]
//! ```

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::method::Codec;
use crate::tree::{Code, CodeTable};
use tracing::{debug, trace, warn};

const TABLE_LEN_BYTES: usize = 4;

/// The prefix-coding engine. Compression level has no effect on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCodec;

impl Codec for HuffmanCodec {
    fn compress(&self, data: &[u8], _level: u32) -> Result<Vec<u8>> {
        compress(data)
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        decompress(payload)
    }
}

/// Header fields of a prefix-coding payload plus the packed bits behind them.
#[derive(Debug)]
pub(crate) struct Packed<'a> {
    pub table: FrequencyTable,
    pub padding: u8,
    pub bits: &'a [u8],
}

impl<'a> Packed<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        if payload.len() < TABLE_LEN_BYTES {
            return Err(Error::corrupt("truncated frequency table length"));
        }
        let (len_bytes, rest) = payload.split_at(TABLE_LEN_BYTES);
        let table_len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
            as usize;
        if rest.len() < table_len {
            return Err(Error::corrupt(format!(
                "frequency table needs {} bytes, {} available",
                table_len,
                rest.len()
            )));
        }
        let (table_bytes, rest) = rest.split_at(table_len);
        let table = FrequencyTable::from_bytes(table_bytes)?;

        let (&padding, bits) = rest
            .split_first()
            .ok_or_else(|| Error::corrupt("missing padding header"))?;
        if padding > 7 {
            return Err(Error::corrupt(format!("padding header {padding} exceeds 7")));
        }
        if bits.is_empty() && padding > 0 {
            return Err(Error::corrupt("padding header set on an empty payload"));
        }

        Ok(Self {
            table,
            padding,
            bits,
        })
    }

    /// Code bits in the payload, padding excluded.
    pub fn bit_len(&self) -> u64 {
        self.bits.len() as u64 * 8 - u64::from(self.padding)
    }
}

/// Encodes `data` into a prefix-coding payload (without the method tag).
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let table = FrequencyTable::from_data(data);
    let codes = CodeTable::from_frequencies(&table)?;
    for (symbol, code) in codes.iter() {
        trace!(symbol, code = %code, "code assigned");
    }

    let mut writer = BitWriter::new();
    for &byte in data {
        let code = codes.get(byte).ok_or(Error::InvalidAlphabet)?;
        writer.write_code(code.value(), code.len());
    }
    let bit_len = writer.bit_len();
    let padding = writer.padding();
    let packed = writer.finish();

    let table_bytes = table.to_bytes();
    let mut out = Vec::with_capacity(TABLE_LEN_BYTES + table_bytes.len() + 1 + packed.len());
    out.extend_from_slice(&(table_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&table_bytes);
    out.push(padding);
    out.extend_from_slice(&packed);

    debug!(
        input_len = data.len(),
        symbols = table.len(),
        max_code_len = codes.max_len(),
        bit_len,
        padding,
        output_len = out.len(),
        "huffman compressed"
    );
    Ok(out)
}

/// Decodes a prefix-coding payload produced by [`compress`].
pub fn decompress(payload: &[u8]) -> Result<Vec<u8>> {
    let packed = Packed::parse(payload)?;
    let codes = CodeTable::from_frequencies(&packed.table)?;
    let expected = packed.table.total();

    // Every code is at least one bit long.
    if expected > packed.bit_len() {
        return Err(Error::corrupt(format!(
            "{} symbols cannot fit in {} bits",
            expected,
            packed.bit_len()
        )));
    }
    if let Some(&last) = packed.bits.last() {
        let pad_mask = (1u16 << packed.padding) as u8 - 1;
        if last & pad_mask != 0 {
            return Err(Error::corrupt("padding bits are not zero"));
        }
    }

    let mut reader = BitReader::with_padding(packed.bits, packed.padding)
        .ok_or_else(|| Error::corrupt("padding exceeds payload"))?;
    let mut out = Vec::with_capacity(expected as usize);
    let mut candidate = Code::default();
    while let Some(bit) = reader.read_bit()? {
        candidate = candidate.push(bit);
        if let Some(symbol) = codes.symbol(candidate) {
            out.push(symbol);
            candidate = Code::default();
        } else if candidate.len() >= codes.max_len() {
            warn!(decoded = out.len(), "unmatched code in huffman stream");
            return Err(Error::corrupt(format!(
                "no code matches a {}-bit prefix after {} symbols",
                candidate.len(),
                out.len()
            )));
        }
    }
    if !candidate.is_empty() {
        return Err(Error::corrupt(format!(
            "stream ends inside a code ({} dangling bits)",
            candidate.len()
        )));
    }

    if FrequencyTable::from_data(&out) != packed.table {
        warn!(
            decoded = out.len(),
            expected, "decoded symbols disagree with frequency table"
        );
        return Err(Error::corrupt(
            "decoded symbol counts do not match the frequency table",
        ));
    }
    debug!(
        output_len = out.len(),
        symbols = packed.table.len(),
        padding = packed.padding,
        "huffman decompressed"
    );
    Ok(out)
}
