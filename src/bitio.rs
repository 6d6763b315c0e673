//! Bit-level I/O over byte streams.
//!
//! Both directions pack bits MSB-first: the first bit written lands in the
//! high bit of the first byte, and a multi-bit field is stored with its
//! most significant bit first.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Bytes buffered by [`BitWriter`] before they are handed to the medium.
const WRITE_CHUNK: usize = 8192;

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Sequential bit reader over any [`Read`].
///
/// End of input is reported as `Ok(None)`, distinct from every valid value.
/// Wrap files in a `BufReader`; the reader pulls one byte at a time.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    container: u64,
    bits_available: u32,
    bits_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        BitReader {
            inner,
            container: 0,
            bits_available: 0,
            bits_read: 0,
        }
    }

    /// Read `width` bits (1..=32), most significant first.
    ///
    /// Returns `None` once fewer than `width` bits remain; the leftover bits
    /// are discarded and every later read also returns `None`.
    pub fn read_bits(&mut self, width: u32) -> io::Result<Option<u32>> {
        debug_assert!((1..=32).contains(&width));
        while self.bits_available < width {
            match self.read_byte()? {
                Some(byte) => {
                    self.container = (self.container << 8) | byte as u64;
                    self.bits_available += 8;
                }
                None => {
                    self.container = 0;
                    self.bits_available = 0;
                    return Ok(None);
                }
            }
        }
        self.bits_available -= width;
        let mask = (1u64 << width) - 1;
        let value = (self.container >> self.bits_available) & mask;
        self.container &= (1u64 << self.bits_available) - 1;
        self.bits_read += width as u64;
        Ok(Some(value as u32))
    }

    /// Total bits handed out since construction or the last [`reset`](Self::reset).
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read + Seek> BitReader<R> {
    /// Rewind to the start of the medium, dropping any buffered bits.
    pub fn reset(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.container = 0;
        self.bits_available = 0;
        self.bits_read = 0;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Sequential bit writer over any [`Write`].
///
/// Call [`finish`](Self::finish) when done: it pads the last partial byte
/// with zero bits and flushes. Dropping the writer loses unflushed bits.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    current: u32,
    bit_pos: u32,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        BitWriter {
            inner,
            buffer: Vec::with_capacity(WRITE_CHUNK),
            current: 0,
            bit_pos: 0,
            bits_written: 0,
        }
    }

    /// Write the low `width` bits of `value` (0..=64), most significant first.
    pub fn write_bits(&mut self, width: u32, value: u64) -> io::Result<()> {
        debug_assert!(width <= 64);
        let mut remaining = width;
        while remaining > 0 {
            let take = remaining.min(8 - self.bit_pos);
            let shift = remaining - take;
            let chunk = ((value >> shift) & ((1u64 << take) - 1)) as u32;
            self.current = (self.current << take) | chunk;
            self.bit_pos += take;
            remaining = shift;
            if self.bit_pos == 8 {
                self.push_byte(self.current as u8)?;
                self.current = 0;
                self.bit_pos = 0;
            }
        }
        self.bits_written += width as u64;
        Ok(())
    }

    /// Total bits written, not counting final padding.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pad to a byte boundary with zeros, flush, and return the medium.
    pub fn finish(mut self) -> io::Result<W> {
        if self.bit_pos > 0 {
            let byte = (self.current << (8 - self.bit_pos)) as u8;
            self.buffer.push(byte);
            self.current = 0;
            self.bit_pos = 0;
        }
        self.inner.write_all(&self.buffer)?;
        self.buffer.clear();
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn push_byte(&mut self, byte: u8) -> io::Result<()> {
        self.buffer.push(byte);
        if self.buffer.len() >= WRITE_CHUNK {
            self.inner.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }
}
