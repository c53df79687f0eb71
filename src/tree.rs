//! Huffman tree construction and the symbol/code tables derived from it.
//!
//! Ties between equal frequencies are broken by a fixed order so that any
//! two builds from the same [`FrequencyTable`] produce the same tree:
//!
//! - leaves are numbered `0..N` in ascending symbol order;
//! - the k-th merged node is numbered `N + k`;
//! - the heap pops the smallest `(frequency, number)` pair first, and the
//!   first of the two popped nodes becomes the left (`0`) child.

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Leaf {
        symbol: u8,
        freq: u64,
    },
    Internal {
        freq: u64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal { freq, .. } => *freq,
        }
    }
}

/// Heap entry ordered by `(freq, order)`, reversed so `BinaryHeap` pops the
/// minimum.
#[derive(Debug)]
struct Pending {
    order: usize,
    node: Node,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.node.freq(), other.order).cmp(&(self.node.freq(), self.order))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Optimal prefix tree for one frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTree {
    root: Node,
}

impl CodeTree {
    /// Builds the tree by repeatedly merging the two lightest nodes.
    pub fn build(table: &FrequencyTable) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::InvalidAlphabet);
        }

        let mut heap: BinaryHeap<Pending> = table
            .iter()
            .enumerate()
            .map(|(order, (symbol, freq))| Pending {
                order,
                node: Node::Leaf { symbol, freq },
            })
            .collect();

        let mut next_order = table.len();
        let root = loop {
            let left = heap.pop().ok_or(Error::InvalidAlphabet)?;
            let Some(right) = heap.pop() else {
                break left.node;
            };
            let freq = left
                .node
                .freq()
                .checked_add(right.node.freq())
                .ok_or_else(|| Error::corrupt("symbol frequencies overflow u64"))?;
            heap.push(Pending {
                order: next_order,
                node: Node::Internal {
                    freq,
                    left: Box::new(left.node),
                    right: Box::new(right.node),
                },
            });
            next_order += 1;
        };
        Ok(Self { root })
    }

    /// Weight of the root, equal to the table's total count.
    pub fn weight(&self) -> u64 {
        self.root.freq()
    }

    /// Derives the code of every leaf: `0` for each left turn, `1` for each
    /// right turn. A lone root leaf gets the one-bit code `0`.
    pub fn code_table(&self) -> CodeTable {
        let mut codes = BTreeMap::new();
        match &self.root {
            Node::Leaf { symbol, .. } => {
                codes.insert(*symbol, Code { value: 0, len: 1 });
            }
            internal => build_codes(internal, Code::default(), &mut codes),
        }
        CodeTable::new(codes)
    }
}

// A node at depth d weighs at least Fib(d + 1), and the root fits in u64, so
// no path comes near MAX_CODE_LEN.
fn build_codes(node: &Node, prefix: Code, codes: &mut BTreeMap<u8, Code>) {
    match node {
        Node::Leaf { symbol, .. } => {
            codes.insert(*symbol, prefix);
        }
        Node::Internal { left, right, .. } => {
            debug_assert!(prefix.len < MAX_CODE_LEN);
            build_codes(left, prefix.push(false), codes);
            build_codes(right, prefix.push(true), codes);
        }
    }
}

/// Longest code a [`Code`] can hold.
pub const MAX_CODE_LEN: u8 = 128;

/// A code word: the low `len` bits of `value`, first bit most significant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Code {
    value: u128,
    len: u8,
}

impl Code {
    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// This code with `bit` appended.
    pub fn push(self, bit: bool) -> Self {
        Self {
            value: (self.value << 1) | u128::from(bit),
            len: self.len + 1,
        }
    }

    /// True if `self` is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && (other.value >> (other.len - self.len)) == self.value
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            f.write_str(if (self.value >> i) & 1 == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Symbol to code mapping together with its inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
    symbols: HashMap<Code, u8>,
    max_len: u8,
}

impl CodeTable {
    fn new(codes: BTreeMap<u8, Code>) -> Self {
        let symbols = codes
            .iter()
            .map(|(&symbol, &code)| (code, symbol))
            .collect();
        let max_len = codes.values().map(Code::len).max().unwrap_or(0);
        Self {
            codes,
            symbols,
            max_len,
        }
    }

    /// Builds the tree for `table` and derives its codes in one step.
    pub fn from_frequencies(table: &FrequencyTable) -> Result<Self> {
        Ok(CodeTree::build(table)?.code_table())
    }

    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    /// Symbol whose code is exactly `code`.
    pub fn symbol(&self, code: Code) -> Option<u8> {
        self.symbols.get(&code).copied()
    }

    /// Length of the longest code.
    pub fn max_len(&self) -> u8 {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes.iter().map(|(&symbol, code)| (symbol, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes_of(data: &[u8]) -> CodeTable {
        CodeTable::from_frequencies(&FrequencyTable::from_data(data)).unwrap()
    }

    #[test]
    fn empty_table_is_invalid_alphabet() {
        assert!(matches!(
            CodeTree::build(&FrequencyTable::new()),
            Err(Error::InvalidAlphabet)
        ));
    }

    #[test]
    fn known_codes_for_small_table() {
        let table = codes_of(b"aaabbbccd");
        let rendered: Vec<String> = table.iter().map(|(_, code)| code.to_string()).collect();
        // a, b, c, d
        assert_eq!(rendered, ["10", "11", "01", "00"]);
        assert_eq!(table.max_len(), 2);
        let c = Code::default().push(false).push(true);
        assert_eq!((c.value(), c.len()), (0b01, 2));
        assert_eq!(table.symbol(c), Some(b'c'));
        assert_eq!(table.symbol(Code::default().push(false)), None);
    }

    #[test]
    fn single_symbol_gets_one_bit_code() {
        let table = codes_of(b"zzzz");
        assert_eq!(table.len(), 1);
        let code = table.get(b'z').unwrap();
        assert_eq!((code.value(), code.len()), (0, 1));
        assert_eq!(table.max_len(), 1);
    }

    #[test]
    fn two_symbols_merge_into_one_root() {
        let table: FrequencyTable = [(b'x', 5), (b'y', 2)].into_iter().collect();
        let tree = CodeTree::build(&table).unwrap();
        assert_eq!(tree.weight(), 7);
        let codes = tree.code_table();
        // The lighter node is popped first and becomes the left child.
        assert_eq!(codes.get(b'y').unwrap().to_string(), "0");
        assert_eq!(codes.get(b'x').unwrap().to_string(), "1");
        assert_eq!(codes.max_len(), 1);
    }

    #[test]
    fn skewed_frequencies_give_longer_codes_to_rarer_symbols() {
        let table: FrequencyTable = [(b'a', 1), (b'b', 2), (b'c', 4), (b'd', 8)]
            .into_iter()
            .collect();
        let codes = CodeTable::from_frequencies(&table).unwrap();
        assert_eq!(codes.get(b'd').unwrap().len(), 1);
        assert_eq!(codes.get(b'c').unwrap().len(), 2);
        assert_eq!(codes.get(b'a').unwrap().len(), 3);
        assert_eq!(codes.get(b'b').unwrap().len(), 3);
    }

    #[test]
    fn codes_are_prefix_free_and_complete() {
        let table = codes_of(b"the quick brown fox jumps over the lazy dog");
        let codes: Vec<&Code> = table.iter().map(|(_, code)| code).collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!a.is_prefix_of(b), "{a} is a prefix of {b}");
                }
            }
        }
        // A full binary tree satisfies Kraft's inequality with equality.
        let kraft: f64 = codes.iter().map(|c| 0.5f64.powi(c.len() as i32)).sum();
        assert!((kraft - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let table = FrequencyTable::from_data(b"abcdefabcdeabcdabcaba");
        let first = CodeTree::build(&table).unwrap();
        let second = CodeTree::build(&table.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.code_table(), second.code_table());
        assert_eq!(first.weight(), table.total());
    }

    #[test]
    fn all_equal_frequencies_give_balanced_codes() {
        let data: Vec<u8> = (0..=255u8).collect();
        let table = codes_of(&data);
        assert!(table.iter().all(|(_, code)| code.len() == 8));
    }

    #[test]
    fn overflowing_frequencies_are_rejected() {
        let table: FrequencyTable = [(0u8, u64::MAX), (1u8, 1)].into_iter().collect();
        assert!(matches!(
            CodeTree::build(&table),
            Err(Error::CorruptStream(_))
        ));
    }
}
