// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns the fields of one parsed log line into a normalized JSON line.
//!
//! Two synthetic fields are injected ahead of the parsed ones:
//!
//! ```json
//! {"resource_type":"alb","resource_name":"my-alb","type":"https","time":"...",...}
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("field count mismatch: expected {expected} fields, got {labels} labels and {values} values")]
    FieldCountMismatch {
        expected: usize,
        labels: usize,
        values: usize,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives the labels and values of every record the parser emits.
///
/// `is_first` is true for the first record of a parse, which fixes the record schema.
pub trait LineHandler {
    fn handle(
        &mut self,
        labels: &[&str],
        values: &[&str],
        is_first: bool,
    ) -> Result<String, NormalizeError>;
}

impl<F> LineHandler for F
where
    F: FnMut(&[&str], &[&str], bool) -> Result<String, NormalizeError>,
{
    fn handle(
        &mut self,
        labels: &[&str],
        values: &[&str],
        is_first: bool,
    ) -> Result<String, NormalizeError> {
        self(labels, values, is_first)
    }
}

/// Line handler tagging every record with the resource it came from.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    resource_type: String,
    resource_name: String,
    width: Option<usize>,
}

impl RecordNormalizer {
    #[must_use]
    pub fn new(resource_type: &str, resource_name: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
            width: None,
        }
    }
}

impl LineHandler for RecordNormalizer {
    fn handle(
        &mut self,
        labels: &[&str],
        values: &[&str],
        is_first: bool,
    ) -> Result<String, NormalizeError> {
        let expected = match self.width {
            Some(width) if !is_first => width,
            _ => labels.len(),
        };
        if labels.len() != expected || values.len() != expected {
            return Err(NormalizeError::FieldCountMismatch {
                expected,
                labels: labels.len(),
                values: values.len(),
            });
        }
        self.width = Some(expected);

        let record = NormalizedRecord {
            resource_type: &self.resource_type,
            resource_name: &self.resource_name,
            labels,
            values,
        };
        Ok(serde_json::to_string(&record)?)
    }
}

struct NormalizedRecord<'a> {
    resource_type: &'a str,
    resource_name: &'a str,
    labels: &'a [&'a str],
    values: &'a [&'a str],
}

impl Serialize for NormalizedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len() + 2))?;
        map.serialize_entry("resource_type", self.resource_type)?;
        map.serialize_entry("resource_name", self.resource_name)?;
        for (label, value) in self.labels.iter().zip(self.values) {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}
