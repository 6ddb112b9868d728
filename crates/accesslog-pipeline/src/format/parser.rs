// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Regex driven line parser.
//!
//! Lines are read one at a time from any [`BufRead`], so a decompressing reader is consumed
//! incrementally. For every line the parser decides:
//!
//! - **skipped**: listed in the skip set (header rows) or blank
//! - **unmatched**: the grammar does not match; counted and sampled, never fatal
//! - **filtered**: matched, but a filter rejected it
//! - **matched**: handed to the [`LineHandler`] and appended to the buffer
//!
//! Bytes that are not valid UTF-8 are replaced with U+FFFD before matching. The line then
//! takes one of the outcomes above like any other, and an unmatched line is sampled with the
//! replacement characters in place.

use std::io::BufRead;

use regex::Regex;
use serde::Serialize;

use super::filter::Filter;
use super::FormatError;
use crate::buffer::AccumulationBuffer;
use crate::normalizer::{LineHandler, NormalizeError};

/// Upper bound on unmatched lines kept verbatim in a [`ParseSummary`].
const MAX_RECORDED_ERRORS: usize = 100;

/// Placeholder for optional fields absent from a line.
const EMPTY_FIELD: &str = "-";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Handler {
        line: usize,
        #[source]
        source: NormalizeError,
    },
}

/// Per-format parser options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Keep-filters, see [`Filter`]
    pub filters: Vec<String>,
    /// 1-based line numbers to skip
    pub skip_lines: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedLine {
    pub index: usize,
    pub record: String,
}

/// Outcome of parsing one object. `total` is the sum of the four disjoint counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    pub source: String,
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub filtered: usize,
    pub skipped: usize,
    pub errors: Vec<UnmatchedLine>,
}

#[derive(Debug, Clone)]
pub struct LineParser {
    regex: Regex,
    labels: Vec<String>,
    filters: Vec<Filter>,
    skip_lines: Vec<usize>,
}

impl LineParser {
    /// Compiles `pattern`; its named captures become the field labels.
    pub fn new(pattern: &str, config: &ParserConfig) -> Result<Self, FormatError> {
        let regex = Regex::new(pattern)?;
        let labels: Vec<String> = regex
            .capture_names()
            .flatten()
            .map(ToString::to_string)
            .collect();
        let filters = config
            .filters
            .iter()
            .map(|expression| Filter::parse(expression, &labels))
            .collect::<Result<Vec<Filter>, FormatError>>()?;
        Ok(LineParser {
            regex,
            labels,
            filters,
            skip_lines: config.skip_lines.clone(),
        })
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Parses every line of `reader`, appending the handler's output to `buffer`.
    ///
    /// A read failure or a handler error aborts the parse; lines already appended stay in
    /// the buffer.
    pub fn parse<R, H>(
        &self,
        mut reader: R,
        source: &str,
        handler: &mut H,
        buffer: &mut AccumulationBuffer,
    ) -> Result<ParseSummary, ParseError>
    where
        R: BufRead,
        H: LineHandler + ?Sized,
    {
        let labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        let mut summary = ParseSummary {
            source: source.to_string(),
            ..ParseSummary::default()
        };
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let read = reader
                .read_until(b'\n', &mut raw)
                .map_err(|source| ParseError::Read {
                    line: summary.total + 1,
                    source,
                })?;
            if read == 0 {
                break;
            }
            summary.total += 1;
            let index = summary.total;

            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(|c: char| c == '\n' || c == '\r');

            if self.skip_lines.contains(&index) || line.trim().is_empty() {
                summary.skipped += 1;
                continue;
            }

            let Some(captures) = self.regex.captures(line) else {
                summary.unmatched += 1;
                if summary.errors.len() < MAX_RECORDED_ERRORS {
                    summary.errors.push(UnmatchedLine {
                        index,
                        record: line.to_string(),
                    });
                }
                continue;
            };

            let values: Vec<&str> = labels
                .iter()
                .map(|label| captures.name(label).map_or(EMPTY_FIELD, |m| m.as_str()))
                .collect();

            if !self.filters.iter().all(|filter| filter.keep(&values)) {
                summary.filtered += 1;
                continue;
            }

            let normalized = handler
                .handle(&labels, &values, summary.matched == 0)
                .map_err(|source| ParseError::Handler {
                    line: index,
                    source,
                })?;
            buffer.push_line(&normalized);
            summary.matched += 1;
        }

        Ok(summary)
    }
}
