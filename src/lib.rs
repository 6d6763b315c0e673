//! # huff
//!
//! Lossless byte-stream compression with a static Huffman code.
//!
//! A compressed stream is a 32-bit magic tag, the Huffman tree written in
//! preorder, one variable-length code per input byte and finally the code
//! of a synthetic end-of-stream symbol:
//!
//! ```text
//! [HUFF_TREE: 32 bits] [tree: 0 = internal, 1 + 9-bit symbol = leaf]
//! [code(byte_0)] ... [code(byte_n-1)] [code(PSEUDO_EOF)] [zero padding]
//! ```
//!
//! ```rust
//! let input = b"abracadabra";
//! let packed = huff::compress(input)?;
//! assert_eq!(huff::decompress(&packed)?, input);
//! # Ok::<(), huff::HuffError>(())
//! ```

pub mod bitio;
pub mod codec;
pub mod frequency;
pub mod header;
pub mod huffman;
pub mod pqueue;

#[cfg(test)]
mod validation;

pub use codec::{
    compress, decompress, CodecOptions, CompressStats, DebugLevel, DecompressStats, Decoder,
    HuffCodec, Step,
};
pub use huffman::{Code, CodeTable, HuffmanTree};

/// A coded symbol: a byte value in `0..=255` or [`PSEUDO_EOF`].
pub type Symbol = u16;

/// Bits in one plain input/output word.
pub const BITS_PER_WORD: u32 = 8;
/// Bits in the magic tag.
pub const BITS_PER_INT: u32 = 32;
/// Number of distinct byte values.
pub const ALPH_SIZE: usize = 1 << BITS_PER_WORD;
/// The end-of-stream symbol. Never produced by input data.
pub const PSEUDO_EOF: Symbol = ALPH_SIZE as Symbol;
/// Byte values plus the end-of-stream symbol.
pub const ALPHABET_SIZE: usize = ALPH_SIZE + 1;

/// Part of a compressed stream that ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The preorder tree following the magic tag.
    Header,
    /// The code sequence, before the end-of-stream code was seen.
    Payload,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => write!(f, "tree header"),
            Self::Payload => write!(f, "payload"),
        }
    }
}

/// Error types for huff operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HuffError {
    /// The stream does not start with the tree-header magic tag.
    #[error("not a huff stream: {}", describe_tag(.found))]
    Format { found: Option<u32> },
    /// The stream carries the count-table header variant, which is not decoded.
    #[error("unsupported huff header variant {found:#010x}")]
    UnsupportedVariant { found: u32 },
    /// End of input while the header or payload still required bits.
    #[error("truncated stream: input ended inside the {section}")]
    Truncated { section: Section },
    /// A symbol met while encoding has no code in the tree. Happens when the
    /// input changes between the counting and encoding passes.
    #[error("symbol {symbol} has no code; input changed between passes")]
    Uncodable { symbol: Symbol },
    /// The header was read completely but does not describe a usable tree.
    #[error("malformed tree header: {0}")]
    MalformedHeader(&'static str),
    /// The underlying medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HuffError {
    /// True if the input is not a decodable stream of this format at all,
    /// as opposed to a damaged one.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::UnsupportedVariant { .. })
    }
}

fn describe_tag(found: &Option<u32>) -> String {
    match found {
        Some(tag) => format!("magic tag {tag:#010x}"),
        None => "input shorter than the magic tag".to_string(),
    }
}

pub type HuffResult<T> = Result<T, HuffError>;
