/// Validation tests across the whole codec.
///
/// These tests verify:
/// 1. **Round-trip correctness** over a broad set of data shapes
/// 2. **Header round-trip** - a tree read back yields the same codes
/// 3. **Corruption handling** - bad tags, truncation, damaged headers
/// 4. **Properties** - prefix-free codes, sentinel inclusion, rewind idempotence
#[cfg(test)]
mod tests {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;
    use std::io::Cursor;

    use proptest::prelude::*;

    use crate::bitio::{BitReader, BitWriter};
    use crate::frequency::{get_frequency, FrequencyTable};
    use crate::header::{read_header, write_header, HUFF_NUMBER};
    use crate::huffman::HuffmanTree;
    use crate::{compress, decompress, HuffError, Section, PSEUDO_EOF};

    // ---------------------------------------------------------------
    // Helper: generate diverse test vectors
    // ---------------------------------------------------------------

    /// Highly compressible: single byte repeated.
    fn data_all_zeros(n: usize) -> Vec<u8> {
        vec![0u8; n]
    }

    /// Incompressible: every byte value once (uniform distribution, 8 bits entropy).
    fn data_uniform() -> Vec<u8> {
        (0..=255u8).collect()
    }

    /// Skewed distribution: 90% one byte, 10% another.
    fn data_skewed(n: usize) -> Vec<u8> {
        (0..n).map(|i| if i % 10 == 0 { 1 } else { 0 }).collect()
    }

    /// Repetitive text with structure.
    fn data_repeating_text() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. ".repeat(100)
    }

    /// Binary data with some structure (sawtooth).
    fn data_sawtooth(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 256) as u8).collect()
    }

    /// Fibonacci-weighted runs. With the end-of-stream leaf as a third
    /// weight-1 symbol the merges form two interleaved chains.
    fn data_fibonacci() -> Vec<u8> {
        let (mut a, mut b) = (1usize, 1usize);
        let mut v = Vec::new();
        for sym in 0..20u8 {
            v.extend(std::iter::repeat(sym).take(a));
            let next = a + b;
            a = b;
            b = next;
        }
        v
    }

    // ---------------------------------------------------------------
    // 1. Round-trip validation
    // ---------------------------------------------------------------

    macro_rules! round_trip_test {
        ($name:ident, $data:expr) => {
            #[test]
            fn $name() {
                let input = $data;
                let packed = compress(&input).unwrap();
                let unpacked = decompress(&packed).unwrap();
                assert_eq!(unpacked, input, "round-trip failed");
            }
        };
    }

    round_trip_test!(round_trip_empty, Vec::<u8>::new());
    round_trip_test!(round_trip_single_byte, vec![42u8]);
    round_trip_test!(round_trip_zeros, data_all_zeros(1000));
    round_trip_test!(round_trip_uniform, data_uniform());
    round_trip_test!(round_trip_skewed, data_skewed(5000));
    round_trip_test!(round_trip_text, data_repeating_text());
    round_trip_test!(round_trip_sawtooth, data_sawtooth(3000));
    round_trip_test!(round_trip_fibonacci, data_fibonacci());
    round_trip_test!(round_trip_high_bytes, vec![0xFFu8, 0xFE, 0xFF, 0x80]);

    #[test]
    fn skewed_data_compresses() {
        let input = data_skewed(10_000);
        let packed = compress(&input).unwrap();
        assert!(
            packed.len() < input.len() / 4,
            "packed {} bytes, input {} bytes",
            packed.len(),
            input.len()
        );
    }

    /// Weighted path length: total payload bits the table produces.
    fn coded_bits(freq: &FrequencyTable, tree: &HuffmanTree) -> u64 {
        tree.code_table()
            .iter()
            .map(|(symbol, code)| freq.get(symbol) * code.len as u64)
            .sum()
    }

    /// Huffman cost computed independently: sum of every merged weight.
    fn optimal_bits(freq: &FrequencyTable) -> u64 {
        let mut heap: BinaryHeap<Reverse<u64>> =
            freq.nonzero().map(|(_, count)| Reverse(count)).collect();
        let mut cost = 0;
        while heap.len() > 1 {
            let (Some(Reverse(a)), Some(Reverse(b))) = (heap.pop(), heap.pop()) else {
                break;
            };
            cost += a + b;
            heap.push(Reverse(a + b));
        }
        cost
    }

    #[test]
    fn fibonacci_tree_is_optimal() {
        let freq = get_frequency(&data_fibonacci());
        let tree = HuffmanTree::from_frequency_table(&freq);
        assert_eq!(tree.depth(), 11);
        assert_eq!(coded_bits(&freq, &tree), optimal_bits(&freq));
    }

    #[test]
    fn fibonacci_counts_build_a_chain() {
        // Sentinel lighter than every byte: each merge absorbs the next symbol.
        let mut freq = FrequencyTable::new();
        let (mut a, mut b) = (2u64, 3u64);
        for sym in 0..20usize {
            freq.counts[sym] = a;
            let next = a + b;
            a = b;
            b = next;
        }
        freq.total = freq.counts[..20].iter().sum();
        freq.used = 21;
        let tree = HuffmanTree::from_frequency_table(&freq);
        assert_eq!(tree.depth(), 20);
        assert_eq!(coded_bits(&freq, &tree), optimal_bits(&freq));
    }

    // ---------------------------------------------------------------
    // 2. Corruption handling
    // ---------------------------------------------------------------

    #[test]
    fn every_truncation_fails_cleanly() {
        let packed = compress(b"truncation at every byte boundary").unwrap();
        for cut in 0..packed.len() {
            let err = decompress(&packed[..cut]).unwrap_err();
            match err {
                HuffError::Format { .. } => assert!(cut < 4, "format error at cut {}", cut),
                HuffError::Truncated { .. } => assert!(cut >= 4),
                other => panic!("unexpected error at cut {}: {:?}", cut, other),
            }
        }
    }

    #[test]
    fn count_variant_is_unsupported() {
        let mut packed = compress(b"variant").unwrap();
        packed[..4].copy_from_slice(&HUFF_NUMBER.to_be_bytes());
        let err = decompress(&packed).unwrap_err();
        assert!(matches!(err, HuffError::UnsupportedVariant { .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn header_without_sentinel_is_rejected() {
        // magic, then 0 [1 'a'] [1 'b']
        let mut w = BitWriter::new(Vec::new());
        w.write_bits(32, crate::header::HUFF_TREE as u64).unwrap();
        w.write_bits(1, 0).unwrap();
        w.write_bits(10, (1 << 9) | b'a' as u64).unwrap();
        w.write_bits(10, (1 << 9) | b'b' as u64).unwrap();
        w.write_bits(8, 0).unwrap();
        let bytes = w.finish().unwrap();
        assert!(matches!(
            decompress(&bytes),
            Err(HuffError::MalformedHeader(_))
        ));
    }

    #[test]
    fn trailing_bytes_do_not_disturb_payload() {
        let input = data_repeating_text();
        let mut packed = compress(&input).unwrap();
        packed.extend_from_slice(b"trailer");
        let out = decompress(&packed).unwrap();
        assert_eq!(&out[..input.len()], &input[..]);
        assert_eq!(out.len(), input.len() + b"trailer".len());
    }

    #[test]
    fn truncated_error_names_payload() {
        let packed = compress(&data_uniform()).unwrap();
        let err = decompress(&packed[..packed.len() - 2]).unwrap_err();
        assert!(matches!(
            err,
            HuffError::Truncated {
                section: Section::Payload
            }
        ));
        assert!(!err.is_format_error());
    }

    // ---------------------------------------------------------------
    // 3. Properties
    // ---------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_round_trip(data in prop::collection::vec(any::<u8>(), 0..2000)) {
            let packed = compress(&data).unwrap();
            prop_assert_eq!(decompress(&packed).unwrap(), data);
        }

        #[test]
        fn prop_round_trip_small_alphabet(data in prop::collection::vec(0u8..4, 0..2000)) {
            let packed = compress(&data).unwrap();
            prop_assert_eq!(decompress(&packed).unwrap(), data);
        }

        #[test]
        fn prop_codes_prefix_free(data in prop::collection::vec(any::<u8>(), 0..500)) {
            let table = HuffmanTree::from_data(&data).code_table();
            let codes: Vec<_> = table.iter().collect();
            for (i, (sa, a)) in codes.iter().enumerate() {
                for (sb, b) in codes.iter().skip(i + 1) {
                    prop_assert!(!a.is_prefix_of(b), "{} ({}) prefixes {} ({})", a, sa, b, sb);
                    prop_assert!(!b.is_prefix_of(a), "{} ({}) prefixes {} ({})", b, sb, a, sa);
                }
            }
        }

        #[test]
        fn prop_sentinel_always_coded(data in prop::collection::vec(any::<u8>(), 0..300)) {
            let freq = get_frequency(&data);
            prop_assert_eq!(freq.get(PSEUDO_EOF), 1);
            let table = HuffmanTree::from_frequency_table(&freq).code_table();
            prop_assert!(table.get(PSEUDO_EOF).is_some());
            // Exactly the observed bytes plus the sentinel.
            prop_assert_eq!(table.len() as u32, freq.used);
        }

        #[test]
        fn prop_header_round_trip(data in prop::collection::vec(any::<u8>(), 0..500)) {
            let tree = HuffmanTree::from_data(&data);
            let mut w = BitWriter::new(Vec::new());
            write_header(&tree, &mut w).unwrap();
            let bytes = w.finish().unwrap();
            let back = read_header(&mut BitReader::new(Cursor::new(bytes))).unwrap();
            prop_assert!(back.same_shape(&tree));
            prop_assert_eq!(back.code_table(), tree.code_table());
        }

        #[test]
        fn prop_counting_rewinds(data in prop::collection::vec(any::<u8>(), 0..300)) {
            let mut reader = BitReader::new(Cursor::new(data.clone()));
            let mut freq = FrequencyTable::new();
            freq.count_stream(&mut reader).unwrap();
            let mut again = Vec::new();
            while let Some(b) = reader.read_bits(8).unwrap() {
                again.push(b as u8);
            }
            prop_assert_eq!(again, data);
        }

        #[test]
        fn prop_corrupt_magic_is_format_error(
            data in prop::collection::vec(any::<u8>(), 0..100),
            tag in any::<u32>(),
        ) {
            prop_assume!(tag != crate::header::HUFF_TREE && tag != HUFF_NUMBER);
            let mut packed = compress(&data).unwrap();
            packed[..4].copy_from_slice(&tag.to_be_bytes());
            let mut out = Vec::new();
            let err = crate::HuffCodec::default()
                .decompress(packed.as_slice(), &mut out)
                .unwrap_err();
            prop_assert!(
                matches!(err, HuffError::Format { found: Some(t) } if t == tag),
                "unexpected error {:?}", err
            );
            prop_assert!(out.is_empty());
        }
    }
}
