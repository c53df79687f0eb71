//! Symbol counts and their wire format.
//!
//! The encoded table is the only thing a decoder needs to rebuild the code
//! tree, so its layout is fixed:
//!
//! ```text
//! [u8 version = 1][varint N][N x (u8 symbol, varint count)]
//! ```
//!
//! Entries are written in ascending symbol order. Varints are unsigned
//! LEB128.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

pub const FORMAT_VERSION: u8 = 1;

const MAX_VARINT_LEN: usize = 10;

/// Occurrence count of every byte value present in some input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every byte of `data`.
    pub fn from_data(data: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &byte in data {
            counts[byte as usize] += 1;
        }
        counts
            .iter()
            .enumerate()
            .map(|(symbol, &count)| (symbol as u8, count))
            .collect()
    }

    /// Adds `count` occurrences of `symbol`. A zero count is a no-op.
    pub fn add(&mut self, symbol: u8, count: u64) {
        if count > 0 {
            *self.counts.entry(symbol).or_insert(0) += count;
        }
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted input.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.len() * 3);
        out.push(FORMAT_VERSION);
        write_varint(&mut out, self.len() as u64);
        for (symbol, count) in self.iter() {
            out.push(symbol);
            write_varint(&mut out, count);
        }
        out
    }

    /// Parses a table written by [`to_bytes`](Self::to_bytes).
    ///
    /// Only the canonical form is accepted: at least one entry, strictly
    /// ascending symbols, positive counts and no trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut input = bytes;
        let version = read_u8(&mut input, "table version")?;
        if version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unknown frequency table version {version}"
            )));
        }

        let n = read_varint(&mut input)?;
        if n == 0 || n > 256 {
            return Err(Error::corrupt(format!("invalid symbol count {n}")));
        }

        let mut counts = BTreeMap::new();
        let mut previous: Option<u8> = None;
        let mut total = 0u64;
        for _ in 0..n {
            let symbol = read_u8(&mut input, "table symbol")?;
            if previous.is_some_and(|p| symbol <= p) {
                return Err(Error::corrupt("frequency table symbols out of order"));
            }
            let count = read_varint(&mut input)?;
            if count == 0 {
                return Err(Error::corrupt(format!("zero count for symbol {symbol}")));
            }
            total = total
                .checked_add(count)
                .ok_or_else(|| Error::corrupt("frequency total overflows u64"))?;
            counts.insert(symbol, count);
            previous = Some(symbol);
        }

        if !input.is_empty() {
            return Err(Error::corrupt(format!(
                "{} trailing bytes after frequency table",
                input.len()
            )));
        }
        Ok(Self { counts })
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (symbol, count) in iter {
            table.add(symbol, count);
        }
        table
    }
}

fn read_u8(input: &mut &[u8], what: &str) -> Result<u8> {
    let (&byte, rest) = input
        .split_first()
        .ok_or_else(|| Error::corrupt(format!("truncated {what}")))?;
    *input = rest;
    Ok(byte)
}

pub(crate) fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub(crate) fn read_varint(input: &mut &[u8]) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = read_u8(input, "varint")?;
        let group = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        // The tenth byte may only carry the single remaining bit of a u64.
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(Error::corrupt("varint overflows u64"));
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::corrupt("varint longer than 10 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_byte() {
        let table = FrequencyTable::from_data(b"aaabbbccd");
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(b'a'), Some(3));
        assert_eq!(table.get(b'b'), Some(3));
        assert_eq!(table.get(b'c'), Some(2));
        assert_eq!(table.get(b'd'), Some(1));
        assert_eq!(table.get(b'e'), None);
        assert_eq!(table.total(), 9);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = FrequencyTable::from_data(b"");
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn encoding_is_canonical() {
        let forward: FrequencyTable = [(b'z', 1), (b'a', 2)].into_iter().collect();
        let backward: FrequencyTable = [(b'a', 2), (b'z', 1)].into_iter().collect();
        assert_eq!(forward.to_bytes(), backward.to_bytes());
        assert_eq!(forward.to_bytes(), vec![FORMAT_VERSION, 2, b'a', 2, b'z', 1]);
    }

    #[test]
    fn large_counts_use_multibyte_varints() {
        let table: FrequencyTable = [(0u8, 300u64), (255u8, u64::MAX - 300)]
            .into_iter()
            .collect();
        let bytes = table.to_bytes();
        assert_eq!(&bytes[..5], &[FORMAT_VERSION, 2, 0, 0xac, 0x02]);
        assert_eq!(FrequencyTable::from_bytes(&bytes).unwrap(), table);
    }

    #[test]
    fn all_256_symbols_survive() {
        let data: Vec<u8> = (0..=255u8).collect();
        let table = FrequencyTable::from_data(&data);
        assert_eq!(FrequencyTable::from_bytes(&table.to_bytes()).unwrap(), table);
    }

    #[test]
    fn rejects_malformed_tables() {
        let cases: &[&[u8]] = &[
            &[],
            &[2, 1, b'a', 1],
            &[FORMAT_VERSION, 0],
            &[FORMAT_VERSION, 1, b'a', 0],
            &[FORMAT_VERSION, 2, b'b', 1, b'a', 1],
            &[FORMAT_VERSION, 2, b'a', 1, b'a', 1],
            &[FORMAT_VERSION, 2, b'a', 1],
            &[FORMAT_VERSION, 1, b'a', 1, 0],
            &[FORMAT_VERSION, 1, b'a', 0x80],
            &[FORMAT_VERSION, 0x81, 0x02],
        ];
        for case in cases {
            assert!(
                matches!(FrequencyTable::from_bytes(case), Err(Error::CorruptStream(_))),
                "accepted {case:?}"
            );
        }
    }

    #[test]
    fn rejects_total_overflow() {
        let mut bytes = vec![FORMAT_VERSION, 2];
        for symbol in [b'a', b'b'] {
            bytes.push(symbol);
            write_varint(&mut bytes, u64::MAX);
        }
        assert!(matches!(
            FrequencyTable::from_bytes(&bytes),
            Err(Error::CorruptStream(_))
        ));
    }

    #[test]
    fn rejects_overlong_varint() {
        let mut bytes = vec![FORMAT_VERSION, 1, b'a'];
        bytes.extend_from_slice(&[0xff; 10]);
        bytes.push(0x01);
        assert!(matches!(
            FrequencyTable::from_bytes(&bytes),
            Err(Error::CorruptStream(_))
        ));
    }
}
