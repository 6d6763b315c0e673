/// Huffman coding: tree construction and code derivation.
///
/// The tree is an owned recursive enum. It is built once from a
/// [`FrequencyTable`] (or read back from a stream header) and never
/// changes afterwards; both the header and the per-symbol codes are
/// derived from it.
use crate::frequency::FrequencyTable;
use crate::pqueue::MinHeap;
use crate::{Symbol, ALPHABET_SIZE, PSEUDO_EOF};

/// Longest code a [`Code`] can hold. Reaching it from counts would take
/// more than F(66) (about 2.7e13) input bytes.
pub const MAX_CODE_LEN: u8 = 64;

/// A node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        symbol: Symbol,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: Symbol, weight: u64) -> Self {
        HuffNode::Leaf { symbol, weight }
    }

    /// Join two subtrees; `left` takes the 0 branch.
    pub fn merge(left: HuffNode, right: HuffNode) -> Self {
        HuffNode::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } | HuffNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    /// Follow one bit: 0 goes left, 1 goes right. Leaves have no children.
    pub fn child(&self, bit: u32) -> Option<&HuffNode> {
        match self {
            HuffNode::Leaf { .. } => None,
            HuffNode::Internal { left, right, .. } => Some(if bit == 0 { left } else { right }),
        }
    }
}

/// A Huffman code: the root-to-leaf path, first step in the highest bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Code {
    /// Path bits, right-aligned.
    pub bits: u64,
    /// Path length. Zero only for the root of a single-leaf tree.
    pub len: u8,
}

impl Code {
    /// True if `self` is a proper or equal prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len
            && other
                .bits
                .checked_shr((other.len - self.len) as u32)
                .unwrap_or(0)
                == self.bits
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in (0..self.len).rev() {
            write!(f, "{}", (self.bits >> i) & 1)?;
        }
        Ok(())
    }
}

/// Codes for every leaf symbol of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; ALPHABET_SIZE],
}

impl CodeTable {
    /// The code for `symbol`, if it is a leaf of the tree.
    pub fn get(&self, symbol: Symbol) -> Option<Code> {
        self.codes.get(symbol as usize).copied().flatten()
    }

    /// All assigned codes in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(s, c)| c.map(|c| (s as Symbol, c)))
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A Huffman tree for encoding and decoding byte streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    /// Wrap an already-built node. Used by the header reader.
    pub fn from_root(root: HuffNode) -> Self {
        HuffmanTree { root }
    }

    /// Build a Huffman tree from input data (plus the end-of-stream symbol).
    pub fn from_data(input: &[u8]) -> Self {
        let mut freq = FrequencyTable::new();
        freq.count(input);
        Self::from_frequency_table(&freq)
    }

    /// Build a Huffman tree from a frequency table.
    ///
    /// Leaves enter the heap in ascending symbol order. The two lowest
    /// weights are merged repeatedly, first popped on the left; equal weights
    /// pop in insertion order, merged nodes counting as inserted when merged.
    /// A table holding only the end-of-stream symbol yields a single-leaf tree.
    pub fn from_frequency_table(freq: &FrequencyTable) -> Self {
        let mut heap: MinHeap<HuffNode> = MinHeap::new();
        for (symbol, count) in freq.nonzero() {
            heap.push(count, HuffNode::leaf(symbol, count));
        }
        // The end-of-stream symbol keeps the heap non-empty even for a
        // hand-built table that zeroed it.
        if freq.get(PSEUDO_EOF) == 0 {
            heap.push(1, HuffNode::leaf(PSEUDO_EOF, 1));
        }

        while heap.len() > 1 {
            if let (Some((_, left)), Some((_, right))) = (heap.pop(), heap.pop()) {
                let merged = HuffNode::merge(left, right);
                heap.push(merged.weight(), merged);
            }
        }
        let root = match heap.pop() {
            Some((_, root)) => root,
            None => HuffNode::leaf(PSEUDO_EOF, 1),
        };
        HuffmanTree { root }
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    /// Derive the code for every leaf by one preorder walk.
    ///
    /// A single-leaf tree gives its root the empty code. Leaves deeper than
    /// [`MAX_CODE_LEN`] get no code.
    pub fn code_table(&self) -> CodeTable {
        let mut codes = [None; ALPHABET_SIZE];
        Self::generate_codes(&self.root, Code::default(), &mut codes);
        CodeTable { codes }
    }

    fn generate_codes(node: &HuffNode, prefix: Code, codes: &mut [Option<Code>; ALPHABET_SIZE]) {
        match node {
            HuffNode::Leaf { symbol, .. } => {
                codes[*symbol as usize] = Some(prefix);
            }
            HuffNode::Internal { left, right, .. } => {
                if prefix.len >= MAX_CODE_LEN {
                    return;
                }
                let len = prefix.len + 1;
                let left_code = Code {
                    bits: prefix.bits << 1,
                    len,
                };
                let right_code = Code {
                    bits: (prefix.bits << 1) | 1,
                    len,
                };
                Self::generate_codes(left, left_code, codes);
                Self::generate_codes(right, right_code, codes);
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &HuffNode) -> usize {
            match node {
                HuffNode::Leaf { .. } => 1,
                HuffNode::Internal { left, right, .. } => count(left) + count(right),
            }
        }
        count(&self.root)
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn depth(node: &HuffNode) -> usize {
            match node {
                HuffNode::Leaf { .. } => 0,
                HuffNode::Internal { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    /// True if the two trees have the same shape and leaf symbols,
    /// ignoring weights. A tree read back from a header carries no weights.
    pub fn same_shape(&self, other: &HuffmanTree) -> bool {
        fn same(a: &HuffNode, b: &HuffNode) -> bool {
            match (a, b) {
                (HuffNode::Leaf { symbol: x, .. }, HuffNode::Leaf { symbol: y, .. }) => x == y,
                (
                    HuffNode::Internal {
                        left: al,
                        right: ar,
                        ..
                    },
                    HuffNode::Internal {
                        left: bl,
                        right: br,
                        ..
                    },
                ) => same(al, bl) && same(ar, br),
                _ => false,
            }
        }
        same(&self.root, &other.root)
    }
}
