//! # zipit
//!
//! Byte-stream compression with two interchangeable codecs behind a one-byte
//! method tag: a Huffman prefix coder and zlib (via `flate2`).
//!
//! ```rust
//! use zipit::{Method, compress, decompress};
//!
//! let container = compress(b"aaabbbccd", Method::Huffman, 9)?;
//! assert_eq!(container[0], Method::Huffman.tag());
//! assert_eq!(decompress(&container)?, b"aaabbbccd");
//! # Ok::<(), zipit::Error>(())
//! ```
//!
//! Container layout:
//!
//! ```text
//! [u8 method tag]
//!   0 = huffman: [u32 BE table length][frequency table][u8 padding][code bits]
//!   1 = deflate: [zlib stream]
//! ```

pub mod bits;
pub mod deflate;
pub mod error;
pub mod frequency;
pub mod huffman;
pub mod method;
pub mod tree;

pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use method::{
    Codec, CompressOptions, ContainerInfo, HuffmanInfo, Method, compress, decompress, inspect,
};
pub use tree::{Code, CodeTable, CodeTree};
