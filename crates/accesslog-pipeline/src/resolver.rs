// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Maps the logical source name of an object (the first segment of its key) to the log
//! format code declared for it.

use std::collections::HashMap;

use crate::config::ConfigError;

/// Read-only `source name -> format code` lookup, built once per process.
///
/// Format codes are kept verbatim here; they are only validated when an object of that
/// source is parsed, so a bad entry fails the invocation that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResolver {
    formats: HashMap<String, String>,
}

impl ResourceResolver {
    /// Parses a JSON object such as `{"my-alb": "alb", "my-cdn": "cf"}`.
    ///
    /// An empty document or an empty object is rejected: a process without any
    /// known source could never produce data.
    pub fn from_json(value: &str) -> Result<Self, ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyResourceMap);
        }
        let formats: HashMap<String, String> =
            serde_json::from_str(value).map_err(ConfigError::MalformedResourceMap)?;
        if formats.is_empty() {
            return Err(ConfigError::EmptyResourceMap);
        }
        Ok(Self { formats })
    }

    #[must_use]
    pub fn resolve(&self, source_name: &str) -> Option<&str> {
        self.formats.get(source_name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
