/// Compression and decompression of whole streams.
///
/// Compression reads the input twice: once to count byte frequencies and,
/// after a rewind, once to emit codes. Decompression is a single pass:
/// magic tag, tree header, then a bit-by-bit tree walk until the
/// end-of-stream leaf. Bits after the end-of-stream code are copied to the
/// output a byte at a time.
use std::io::{Cursor, Read, Seek, Write};

use tracing::{debug, trace};

use crate::bitio::{BitReader, BitWriter};
use crate::frequency::FrequencyTable;
use crate::header::{read_header, read_magic, write_header, write_magic};
use crate::huffman::{CodeTable, HuffNode, HuffmanTree};
use crate::{HuffError, HuffResult, Section, Symbol, BITS_PER_WORD, PSEUDO_EOF};

/// How much a codec reports through `tracing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DebugLevel {
    /// Nothing.
    #[default]
    Off,
    /// One summary event per compress/decompress call.
    Low,
    /// Also every nonzero count and every derived code.
    High,
}

/// Options for a [`HuffCodec`].
#[derive(Debug, Clone, Default)]
pub struct CodecOptions {
    pub debug_level: DebugLevel,
}

/// Sizes observed while compressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressStats {
    /// Bytes read from the input (one pass).
    pub input_bytes: u64,
    /// Bits of the tree header, not counting the magic tag.
    pub header_bits: u64,
    /// Bits of codes, end-of-stream code included.
    pub payload_bits: u64,
    /// All bits written before padding to a byte boundary.
    pub output_bits: u64,
}

/// Sizes observed while decompressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecompressStats {
    /// Bits consumed up to and including the end-of-stream code.
    pub bits_read: u64,
    /// Bytes decoded from the payload.
    pub output_bytes: u64,
    /// Bytes copied from after the end-of-stream code.
    pub tail_bytes: u64,
}

/// A Huffman compressor/decompressor.
///
/// Holds only options; every call owns its own streams and tree.
#[derive(Debug, Clone, Default)]
pub struct HuffCodec {
    options: CodecOptions,
}

impl HuffCodec {
    pub fn new(options: CodecOptions) -> Self {
        HuffCodec { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Compress all of `input` into `output`.
    ///
    /// `input` is read from offset 0 to the end, rewound, and read again.
    /// Never fails for well-behaved media; a byte that shows up only on the
    /// second pass (the input changed in between) is reported as
    /// [`HuffError::Uncodable`].
    pub fn compress<R: Read + Seek, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> HuffResult<CompressStats> {
        let mut reader = BitReader::new(input);
        let mut writer = BitWriter::new(output);

        reader.reset()?;
        let mut freq = FrequencyTable::new();
        freq.count_stream(&mut reader)?;
        if self.enabled(DebugLevel::High) {
            for (symbol, count) in freq.nonzero() {
                trace!(symbol, count, "frequency");
            }
        }

        let tree = HuffmanTree::from_frequency_table(&freq);
        let codes = tree.code_table();
        if self.enabled(DebugLevel::High) {
            for (symbol, code) in codes.iter() {
                trace!(symbol, code = %code, "encoding");
            }
        }

        write_magic(&mut writer)?;
        let before_header = writer.bits_written();
        write_header(&tree, &mut writer)?;
        let header_bits = writer.bits_written() - before_header;

        reader.reset()?;
        let input_bytes = write_compressed_bits(&codes, &mut reader, &mut writer)?;
        let output_bits = writer.bits_written();
        writer.finish()?;

        let stats = CompressStats {
            input_bytes,
            header_bits,
            payload_bits: output_bits - before_header - header_bits,
            output_bits,
        };
        if self.enabled(DebugLevel::Low) {
            debug!(
                input_bytes,
                symbols = freq.used,
                entropy = freq.entropy() as f64,
                depth = tree.depth(),
                header_bits,
                payload_bits = stats.payload_bits,
                "compressed"
            );
        }
        Ok(stats)
    }

    /// Decompress `input` into `output`.
    ///
    /// On error, whatever reached `output` must be discarded. A bad magic
    /// tag is detected before anything is written.
    pub fn decompress<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> HuffResult<DecompressStats> {
        let mut reader = BitReader::new(input);
        read_magic(&mut reader)?;
        let tree = read_header(&mut reader)?;
        if self.enabled(DebugLevel::High) {
            for (symbol, code) in tree.code_table().iter() {
                trace!(symbol, code = %code, "decoding");
            }
        }

        let mut writer = BitWriter::new(output);
        let output_bytes = Decoder::new(&tree)?.run(&mut reader, &mut writer)?;
        let bits_read = reader.bits_read();

        let mut tail_bytes = 0u64;
        while let Some(word) = reader.read_bits(BITS_PER_WORD)? {
            writer.write_bits(BITS_PER_WORD, word as u64)?;
            tail_bytes += 1;
        }
        writer.finish()?;

        if self.enabled(DebugLevel::Low) {
            debug!(bits_read, output_bytes, tail_bytes, "decompressed");
        }
        Ok(DecompressStats {
            bits_read,
            output_bytes,
            tail_bytes,
        })
    }

    fn enabled(&self, level: DebugLevel) -> bool {
        self.options.debug_level >= level
    }
}

/// Emit the code of every byte left in `reader`, then the end-of-stream code.
///
/// Returns the number of bytes encoded.
fn write_compressed_bits<R: Read, W: Write>(
    codes: &CodeTable,
    reader: &mut BitReader<R>,
    writer: &mut BitWriter<W>,
) -> HuffResult<u64> {
    let mut count = 0u64;
    while let Some(word) = reader.read_bits(BITS_PER_WORD)? {
        let code = codes
            .get(word as Symbol)
            .ok_or(HuffError::Uncodable {
                symbol: word as Symbol,
            })?;
        writer.write_bits(code.len as u32, code.bits)?;
        count += 1;
    }
    let eof = codes
        .get(PSEUDO_EOF)
        .ok_or(HuffError::Uncodable { symbol: PSEUDO_EOF })?;
    writer.write_bits(eof.len as u32, eof.bits)?;
    Ok(count)
}

/// Result of feeding one bit to a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to an internal node; more bits are needed.
    Continue,
    /// Reached a byte leaf; the walk restarted at the root.
    Emit(u8),
    /// Reached the end-of-stream leaf.
    Done,
}

/// Tree-walking payload decoder.
///
/// Starts at the root. Each bit moves to a child; a byte leaf emits its
/// byte and returns to the root, the end-of-stream leaf finishes the walk.
#[derive(Debug)]
pub struct Decoder<'t> {
    root: &'t HuffNode,
    current: &'t HuffNode,
    done: bool,
}

impl<'t> Decoder<'t> {
    /// A single-leaf tree must be the end-of-stream leaf; it decodes as
    /// finished without reading any bits.
    pub fn new(tree: &'t HuffmanTree) -> HuffResult<Self> {
        let root = tree.root();
        let done = match root {
            HuffNode::Leaf { symbol, .. } if *symbol == PSEUDO_EOF => true,
            HuffNode::Leaf { .. } => {
                return Err(HuffError::MalformedHeader(
                    "single-leaf tree without end-of-stream symbol",
                ))
            }
            HuffNode::Internal { .. } => false,
        };
        Ok(Decoder {
            root,
            current: root,
            done,
        })
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// True when positioned at the root, between codes.
    pub fn at_root(&self) -> bool {
        std::ptr::eq(self.current, self.root)
    }

    /// Feed one bit.
    pub fn step(&mut self, bit: u32) -> Step {
        if self.done {
            return Step::Done;
        }
        let next = match self.current.child(bit) {
            Some(next) => next,
            None => {
                // Only a leaf root has no children, and that is handled in new().
                self.done = true;
                return Step::Done;
            }
        };
        match next {
            HuffNode::Leaf { symbol, .. } if *symbol == PSEUDO_EOF => {
                self.current = next;
                self.done = true;
                Step::Done
            }
            HuffNode::Leaf { symbol, .. } => {
                self.current = self.root;
                Step::Emit(*symbol as u8)
            }
            HuffNode::Internal { .. } => {
                self.current = next;
                Step::Continue
            }
        }
    }

    /// Decode until the end-of-stream leaf, writing each byte to `writer`.
    ///
    /// Returns the number of bytes written. Running out of input first is
    /// a truncated payload.
    pub fn run<R: Read, W: Write>(
        &mut self,
        reader: &mut BitReader<R>,
        writer: &mut BitWriter<W>,
    ) -> HuffResult<u64> {
        let mut written = 0u64;
        while !self.done {
            let bit = reader.read_bits(1)?.ok_or(HuffError::Truncated {
                section: Section::Payload,
            })?;
            if let Step::Emit(byte) = self.step(bit) {
                writer.write_bits(BITS_PER_WORD, byte as u64)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Compress a byte slice with default options.
pub fn compress(input: &[u8]) -> HuffResult<Vec<u8>> {
    let mut output = Vec::new();
    HuffCodec::default().compress(Cursor::new(input), &mut output)?;
    Ok(output)
}

/// Decompress a byte slice with default options.
pub fn decompress(input: &[u8]) -> HuffResult<Vec<u8>> {
    let mut output = Vec::new();
    HuffCodec::default().decompress(input, &mut output)?;
    Ok(output)
}
