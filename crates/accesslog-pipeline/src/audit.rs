// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Progress lines consumed by external log tooling.
//!
//! Audit lines are emitted as `tracing` events on the [`AUDIT_TARGET`] target whose message
//! is one serialized JSON object. [`crate::logger::Formatter`] prints them verbatim.

use serde::Serialize;
use tracing::{info, warn};

use crate::delivery::PutRecordBatchOutput;
use crate::format::parser::ParseSummary;

pub const AUDIT_TARGET: &str = "audit";

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AuditLine<'a> {
    /// An object was fetched
    Object { key: &'a str },
    /// An object was ignored because its source has no declared format
    Skip {
        skip: &'a str,
        key: &'a str,
        reason: &'static str,
    },
    Parse(&'a ParseSummary),
    Delivery(&'a PutRecordBatchOutput),
}

pub fn emit(line: &AuditLine<'_>) {
    match serde_json::to_string(line) {
        Ok(json) => info!(target: AUDIT_TARGET, "{json}"),
        Err(e) => warn!("Failed to serialize audit line: {e}"),
    }
}
