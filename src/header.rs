//! Stream magic tag and the preorder tree header.
//!
//! The tree is written node by node, parents before children:
//! an internal node is a single `0` bit followed by its left and right
//! subtrees, a leaf is a `1` bit followed by its symbol in 9 bits. The
//! encoding needs no length field; a reader consumes exactly the bits the
//! writer produced.

use std::io::{Read, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::huffman::{HuffNode, HuffmanTree};
use crate::{
    HuffError, HuffResult, Section, ALPHABET_SIZE, BITS_PER_INT, BITS_PER_WORD, PSEUDO_EOF,
};

/// Magic tag of the count-table header variant. Recognized, never decoded.
pub const HUFF_NUMBER: u32 = 0xface_8200;
/// Magic tag of the tree header variant written by this crate.
pub const HUFF_TREE: u32 = HUFF_NUMBER | 1;

/// Width of a leaf's symbol field.
pub const SYMBOL_BITS: u32 = BITS_PER_WORD + 1;

/// No valid tree over 257 symbols is deeper than this.
pub const MAX_TREE_DEPTH: usize = ALPHABET_SIZE - 1;

/// Write the tree-header magic tag.
pub fn write_magic<W: Write>(out: &mut BitWriter<W>) -> HuffResult<()> {
    out.write_bits(BITS_PER_INT, HUFF_TREE as u64)?;
    Ok(())
}

/// Read and check the magic tag.
///
/// Fails with a format error, before anything else is read, if the stream
/// is not a tree-header stream.
pub fn read_magic<R: Read>(input: &mut BitReader<R>) -> HuffResult<()> {
    match input.read_bits(BITS_PER_INT)? {
        Some(HUFF_TREE) => Ok(()),
        Some(HUFF_NUMBER) => Err(HuffError::UnsupportedVariant { found: HUFF_NUMBER }),
        found => Err(HuffError::Format { found }),
    }
}

/// Serialize `tree` in preorder.
pub fn write_header<W: Write>(tree: &HuffmanTree, out: &mut BitWriter<W>) -> HuffResult<()> {
    write_node(tree.root(), out)
}

fn write_node<W: Write>(node: &HuffNode, out: &mut BitWriter<W>) -> HuffResult<()> {
    match node {
        HuffNode::Leaf { symbol, .. } => {
            out.write_bits(1, 1)?;
            out.write_bits(SYMBOL_BITS, *symbol as u64)?;
        }
        HuffNode::Internal { left, right, .. } => {
            out.write_bits(1, 0)?;
            write_node(left, out)?;
            write_node(right, out)?;
        }
    }
    Ok(())
}

/// Deserialize a preorder tree header.
///
/// Node weights are not stored and come back as zero. Besides truncation,
/// the tree is rejected if a symbol is out of range or repeated, if it is
/// deeper than [`MAX_TREE_DEPTH`], or if it has no end-of-stream leaf.
pub fn read_header<R: Read>(input: &mut BitReader<R>) -> HuffResult<HuffmanTree> {
    let mut seen = [false; ALPHABET_SIZE];
    let root = read_node(input, 0, &mut seen)?;
    if !seen[PSEUDO_EOF as usize] {
        return Err(HuffError::MalformedHeader("no end-of-stream leaf"));
    }
    Ok(HuffmanTree::from_root(root))
}

fn read_node<R: Read>(
    input: &mut BitReader<R>,
    depth: usize,
    seen: &mut [bool; ALPHABET_SIZE],
) -> HuffResult<HuffNode> {
    let truncated = HuffError::Truncated {
        section: Section::Header,
    };
    match input.read_bits(1)? {
        None => Err(truncated),
        Some(0) => {
            if depth >= MAX_TREE_DEPTH {
                return Err(HuffError::MalformedHeader("tree deeper than the alphabet allows"));
            }
            let left = read_node(input, depth + 1, seen)?;
            let right = read_node(input, depth + 1, seen)?;
            Ok(HuffNode::Internal {
                weight: 0,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        Some(_) => {
            let value = input.read_bits(SYMBOL_BITS)?.ok_or(truncated)? as usize;
            let slot = seen
                .get_mut(value)
                .ok_or(HuffError::MalformedHeader("leaf symbol out of range"))?;
            if *slot {
                return Err(HuffError::MalformedHeader("leaf symbol repeated"));
            }
            *slot = true;
            Ok(HuffNode::leaf(value as u16, 0))
        }
    }
}
