//! MSB-first bit packing.
//!
//! Bits go into each output byte from the most significant position down.
//! Padding is only ever added by [`BitWriter::finish`]; the pad length is not
//! part of the packed stream and has to travel separately.

use bitstream_io::{BigEndian, BitRead};
use std::io;

/// Accumulates individual bits into bytes. Writing to memory cannot fail.
#[derive(Debug, Default)]
pub struct BitWriter {
    buffer: Vec<u8>,
    current_byte: u8,
    bit_pos: u8,
    bit_len: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current_byte |= 1 << (7 - self.bit_pos);
        }
        self.bit_pos += 1;
        self.bit_len += 1;
        if self.bit_pos == 8 {
            self.flush_byte();
        }
    }

    /// Appends `bits` in order.
    pub fn write(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.write_bit(bit);
        }
    }

    /// Appends the low `len` bits of `value`, most significant first.
    pub fn write_code(&mut self, value: u128, len: u8) {
        for i in (0..len).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    fn flush_byte(&mut self) {
        self.buffer.push(self.current_byte);
        self.current_byte = 0;
        self.bit_pos = 0;
    }

    /// Number of bits written so far, padding excluded.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Zero bits needed to reach the next byte boundary, in `0..=7`.
    pub fn padding(&self) -> u8 {
        (8 - self.bit_pos) % 8
    }

    /// Appends [`padding`](Self::padding) zero bits and returns the packed
    /// bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_pos > 0 {
            self.flush_byte();
        }
        self.buffer
    }
}

/// Reads bits back out of a byte slice, stopping before any trailing padding.
pub struct BitReader<'a> {
    inner: bitstream_io::BitReader<&'a [u8], BigEndian>,
    remaining: u64,
}

impl<'a> BitReader<'a> {
    /// Reader over every bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: bitstream_io::BitReader::endian(data, BigEndian),
            remaining: data.len() as u64 * 8,
        }
    }

    /// Reader over `data` that ignores the last `pad` bits.
    ///
    /// Returns `None` when `pad` is larger than the data itself.
    pub fn with_padding(data: &'a [u8], pad: u8) -> Option<Self> {
        let total = data.len() as u64 * 8;
        let pad = u64::from(pad);
        if pad > total {
            return None;
        }
        let mut reader = Self::new(data);
        reader.remaining = total - pad;
        Some(reader)
    }

    /// Next bit, or `None` once the readable bits are exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let bit = self.inner.read_bit()?;
        self.remaining -= 1;
        Ok(Some(bit))
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Expands `data` into its bits, MSB first; always `8 * data.len()` long.
    pub fn to_bits(data: &[u8]) -> Vec<bool> {
        data.iter()
            .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
            .collect()
    }
}
