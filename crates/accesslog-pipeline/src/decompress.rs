// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io::{BufRead, BufReader};

use flate2::read::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[must_use]
pub fn is_gzip(body: &[u8]) -> bool {
    body.starts_with(&GZIP_MAGIC)
}

/// Opens a line reader over an object body.
///
/// Gzip payloads (possibly several concatenated members) are inflated while they are read;
/// anything else is read as plain text. The reader borrows `body` and releases its
/// decoder state when dropped.
#[must_use]
pub fn open(body: &[u8]) -> Box<dyn BufRead + '_> {
    if is_gzip(body) {
        Box::new(BufReader::new(MultiGzDecoder::new(body)))
    } else {
        Box::new(body)
    }
}
