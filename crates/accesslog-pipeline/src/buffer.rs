// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;

/// Append-only byte buffer collecting the normalized lines of one invocation.
///
/// Every line is stored newline-terminated, in arrival order. The buffer is consumed
/// exactly once by [`AccumulationBuffer::freeze`] before chunking.
#[derive(Debug, Default)]
pub struct AccumulationBuffer {
    data: Vec<u8>,
    records: usize,
}

impl AccumulationBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            records: 0,
        }
    }

    /// Appends one normalized line, adding the terminator if the line lacks it.
    pub fn push_line(&mut self, line: &str) {
        let line = line.strip_suffix('\n').unwrap_or(line);
        debug_assert!(!line.contains('\n'), "normalized line spans several lines");
        self.data.extend_from_slice(line.as_bytes());
        self.data.push(b'\n');
        self.records += 1;
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.data)
    }
}
