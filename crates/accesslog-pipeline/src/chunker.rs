// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Splits the accumulated output into delivery-sized chunks.
//!
//! The delivery stream rejects a whole batch request when it carries too many records or
//! too many bytes, so every chunk has to satisfy both bounds at once:
//!
//! 1. **Count limit**: at most `max_records` newline-delimited records
//! 2. **Size limit**: at most `max_bytes` bytes, terminators included
//!
//! Records are never split, reordered or dropped. A single record larger than `max_bytes`
//! cannot satisfy the size limit in any chunk; it is emitted alone in its own oversized
//! chunk and a warning is logged.
//!
//! Chunks are zero-copy slices of the input, so concatenating them in order yields the
//! input byte for byte, including a missing final terminator.

use bytes::Bytes;
use tracing::warn;

/// Default record bound, below the delivery API's 500 records per request.
pub const DEFAULT_MAX_RECORDS_PER_CHUNK: usize = 400;

/// Default size bound, below the delivery API's 4 MiB per request.
pub const DEFAULT_MAX_BYTES_PER_CHUNK: usize = 3 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub max_records: usize,
    pub max_bytes: usize,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        ChunkLimits {
            max_records: DEFAULT_MAX_RECORDS_PER_CHUNK,
            max_bytes: DEFAULT_MAX_BYTES_PER_CHUNK,
        }
    }
}

/// A contiguous run of records destined for one delivery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Bytes,
    pub records: usize,
}

impl Chunk {
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Splits `buffer` into chunks that respect `limits`.
///
/// The empty remainder after a final newline is not a record. An empty buffer yields no
/// chunks at all.
#[must_use]
pub fn split(buffer: &Bytes, limits: &ChunkLimits) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    // current chunk is buffer[start..end] holding `count` records
    let mut start = 0;
    let mut end = 0;
    let mut count = 0;

    while end < buffer.len() {
        let record_end = buffer[end..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(buffer.len(), |i| end + i + 1);
        let record_len = record_end - end;

        if count > 0
            && (count + 1 > limits.max_records || end - start + record_len > limits.max_bytes)
        {
            chunks.push(Chunk {
                data: buffer.slice(start..end),
                records: count,
            });
            start = end;
            count = 0;
        }

        if record_len > limits.max_bytes {
            warn!(
                "Record of {} bytes exceeds the {} bytes chunk limit, sending it alone",
                record_len, limits.max_bytes
            );
        }

        end = record_end;
        count += 1;
    }

    if count > 0 {
        chunks.push(Chunk {
            data: buffer.slice(start..end),
            records: count,
        });
    }
    chunks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits(max_records: usize, max_bytes: usize) -> ChunkLimits {
        ChunkLimits {
            max_records,
            max_bytes,
        }
    }

    fn concat(chunks: &[Chunk]) -> Vec<u8> {
        chunks.iter().flat_map(|c| c.data.iter().copied()).collect()
    }

    fn record_counts(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(|c| c.records).collect()
    }

    #[test]
    fn test_default_limits() {
        let limits = ChunkLimits::default();
        assert_eq!(limits.max_records, 400);
        assert_eq!(limits.max_bytes, 3 * 1024 * 1024);
    }

    #[test]
    fn test_empty_buffer_yields_no_chunks() {
        assert!(split(&Bytes::new(), &ChunkLimits::default()).is_empty());
    }

    #[test]
    fn test_trailing_newline_is_not_a_record() {
        let buffer = Bytes::from_static(b"a\nb\n");
        let chunks = split(&buffer, &ChunkLimits::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].records, 2);
        assert_eq!(&chunks[0].data[..], b"a\nb\n");
    }

    #[test]
    fn test_no_trailing_newline() {
        let buffer = Bytes::from_static(b"aa\nbb\ncc");
        let chunks = split(&buffer, &limits(2, 100));
        assert_eq!(record_counts(&chunks), vec![2, 1]);
        assert_eq!(&chunks[0].data[..], b"aa\nbb\n");
        assert_eq!(&chunks[1].data[..], b"cc");
        assert_eq!(concat(&chunks), buffer.to_vec());
    }

    #[test]
    fn test_blank_interior_lines_are_records() {
        let buffer = Bytes::from_static(b"a\n\nb\n");
        let chunks = split(&buffer, &limits(2, 100));
        assert_eq!(record_counts(&chunks), vec![2, 1]);
        assert_eq!(&chunks[0].data[..], b"a\n\n");
    }

    #[test]
    fn test_buffer_exactly_at_max_bytes() {
        // 4 records of 5 bytes each
        let buffer = Bytes::from_static(b"0000\n1111\n2222\n3333\n");
        let chunks = split(&buffer, &limits(400, 20));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].records, 4);
        assert_eq!(chunks[0].len(), 20);
    }

    #[test]
    fn test_one_byte_over_max_bytes() {
        let buffer = Bytes::from_static(b"0000\n1111\n2222\n3333\n");
        let chunks = split(&buffer, &limits(400, 19));
        assert_eq!(record_counts(&chunks), vec![3, 1]);
        assert_eq!(&chunks[1].data[..], b"3333\n");
    }

    #[test]
    fn test_record_exactly_max_bytes() {
        let buffer = Bytes::from_static(b"123456789\nab\n");
        let chunks = split(&buffer, &limits(400, 10));
        assert_eq!(record_counts(&chunks), vec![1, 1]);
        assert_eq!(&chunks[0].data[..], b"123456789\n");
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(&chunks[1].data[..], b"ab\n");
    }

    #[test]
    fn test_more_records_than_max_records() {
        let buffer = Bytes::from("x\n".repeat(7));
        let chunks = split(&buffer, &limits(3, 1_000));
        assert_eq!(record_counts(&chunks), vec![3, 3, 1]);
        assert_eq!(concat(&chunks), buffer.to_vec());
    }

    #[test]
    fn test_count_bound_then_size_bound() {
        // 1000 one-line records of 10 bytes each
        let buffer = Bytes::from("123456789\n".repeat(1000));
        let chunks = split(&buffer, &limits(400, 1_000_000));
        assert_eq!(record_counts(&chunks), vec![400, 400, 200]);
        assert!(chunks.iter().all(|c| c.len() == c.records * 10));

        let chunks = split(&buffer, &limits(400, 1_000));
        assert_eq!(chunks.len(), 10);
        assert!(chunks.iter().all(|c| c.records == 100 && c.len() == 1_000));
    }

    #[test]
    fn test_oversized_record_gets_its_own_chunk() {
        let max_bytes = 3 * 1024 * 1024;
        let mut data = vec![b'a'; 5 * 1024 * 1024];
        data.push(b'\n');
        data.extend_from_slice(b"123456789\n");
        let buffer = Bytes::from(data);

        let chunks = split(&buffer, &limits(400, max_bytes));
        assert_eq!(record_counts(&chunks), vec![1, 1]);
        assert_eq!(chunks[0].len(), 5 * 1024 * 1024 + 1);
        assert_eq!(&chunks[1].data[..], b"123456789\n");
    }

    #[test]
    fn test_oversized_record_between_small_ones() {
        let buffer = Bytes::from_static(b"a\nbbbbbbbbbbbbbbbbbbbb\nc\nd\n");
        let chunks = split(&buffer, &limits(400, 8));
        assert_eq!(record_counts(&chunks), vec![1, 1, 2]);
        assert_eq!(&chunks[1].data[..], b"bbbbbbbbbbbbbbbbbbbb\n");
        assert_eq!(&chunks[2].data[..], b"c\nd\n");
    }

    #[test]
    fn test_single_record_limit() {
        let buffer = Bytes::from_static(b"a\nb\nc");
        let chunks = split(&buffer, &limits(1, 100));
        assert_eq!(record_counts(&chunks), vec![1, 1, 1]);
        assert_eq!(&chunks[2].data[..], b"c");
    }

    fn arb_buffer() -> impl Strategy<Value = Vec<u8>> {
        (
            prop::collection::vec(prop::collection::vec(b'a'..=b'z', 0..40), 0..120),
            any::<bool>(),
        )
            .prop_map(|(records, trailing)| {
                let mut data = records.join(&b'\n');
                if trailing && !data.is_empty() {
                    data.push(b'\n');
                }
                data
            })
    }

    proptest! {
        #[test]
        fn prop_chunks_respect_both_bounds(
            data in arb_buffer(),
            max_records in 1usize..20,
            max_bytes in 1usize..200,
        ) {
            let buffer = Bytes::from(data);
            let limits = limits(max_records, max_bytes);
            for chunk in split(&buffer, &limits) {
                prop_assert!(chunk.records >= 1);
                prop_assert!(chunk.records <= max_records);
                prop_assert!(chunk.len() <= max_bytes || chunk.records == 1);
            }
        }

        #[test]
        fn prop_concatenation_reproduces_buffer(
            data in arb_buffer(),
            max_records in 1usize..20,
            max_bytes in 1usize..200,
        ) {
            let buffer = Bytes::from(data);
            let chunks = split(&buffer, &limits(max_records, max_bytes));
            prop_assert_eq!(concat(&chunks), buffer.to_vec());

            let total: usize = chunks.iter().map(|c| c.records).sum();
            let expected = buffer.split(|&b| b == b'\n').count()
                - usize::from(buffer.ends_with(b"\n"))
                - usize::from(buffer.is_empty());
            prop_assert_eq!(total, expected);
        }

        #[test]
        fn prop_resplit_is_idempotent(
            data in arb_buffer(),
            max_records in 1usize..20,
            max_bytes in 1usize..200,
        ) {
            let buffer = Bytes::from(data);
            let limits = limits(max_records, max_bytes);
            let first = split(&buffer, &limits);
            let second = split(&Bytes::from(concat(&first)), &limits);
            prop_assert_eq!(first, second);
        }
    }
}
