//! Frequency analysis for byte streams.
//!
//! Counts the occurrence of each byte value (0-255) and always gives the
//! end-of-stream symbol a count of one, so every tree built from a table
//! has a code for it.

use std::io::{Read, Seek};

use crate::bitio::BitReader;
use crate::{HuffResult, Symbol, ALPHABET_SIZE, BITS_PER_WORD, PSEUDO_EOF};

/// A frequency table over the 257-symbol alphabet.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    /// Count of each symbol (index = symbol, value = count).
    pub counts: [u64; ALPHABET_SIZE],
    /// Number of input bytes counted. The end-of-stream symbol is not included.
    pub total: u64,
    /// Number of distinct symbols with nonzero count, end-of-stream included.
    pub used: u32,
}

impl FrequencyTable {
    /// Create a table holding only the end-of-stream symbol.
    pub fn new() -> Self {
        let mut counts = [0u64; ALPHABET_SIZE];
        counts[PSEUDO_EOF as usize] = 1;
        Self {
            counts,
            total: 0,
            used: 1,
        }
    }

    /// Count byte frequencies in an in-memory buffer.
    pub fn count(&mut self, input: &[u8]) {
        for &b in input {
            self.counts[b as usize] += 1;
        }
        self.finalize();
    }

    /// Count every byte left in `reader`, then rewind it to the start.
    ///
    /// After this returns the reader yields exactly the same bits again.
    pub fn count_stream<R: Read + Seek>(&mut self, reader: &mut BitReader<R>) -> HuffResult<()> {
        while let Some(word) = reader.read_bits(BITS_PER_WORD)? {
            self.counts[word as usize] += 1;
        }
        reader.reset()?;
        self.finalize();
        Ok(())
    }

    fn finalize(&mut self) {
        self.counts[PSEUDO_EOF as usize] = 1;
        let mut total = 0u64;
        let mut used = 0u32;
        for (symbol, &c) in self.counts.iter().enumerate() {
            if symbol != PSEUDO_EOF as usize {
                total += c;
            }
            used += (c > 0) as u32;
        }
        self.total = total;
        self.used = used;
    }

    /// Compute the Shannon entropy of the byte distribution (in bits per byte).
    ///
    /// Returns 0.0 if no bytes were counted.
    pub fn entropy(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f32;
        self.counts[..PSEUDO_EOF as usize]
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let prob = c as f32 / total;
                -prob * prob.log2()
            })
            .sum()
    }

    /// Get the count for a specific symbol.
    pub fn get(&self, symbol: Symbol) -> u64 {
        self.counts[symbol as usize]
    }

    /// Symbols with nonzero count, ascending, paired with their counts.
    pub fn nonzero(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as Symbol, c))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: compute a frequency table from input.
pub fn get_frequency(input: &[u8]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    table.count(input);
    table
}
