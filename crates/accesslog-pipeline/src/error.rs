// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Invocation-level error type.
//!
//! Every failure aborts the whole invocation. The surrounding queue redelivers the batch, so
//! chunks delivered before the failure may be delivered again (at-least-once).

use crate::config::ConfigError;
use crate::delivery::DeliveryError;
use crate::event::EventError;
use crate::fetch::FetchError;
use crate::format::parser::ParseError;
use crate::format::FormatError;

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed configuration. Redelivery will not help.
    Configuration,
    /// Network failure talking to the object store or the delivery stream.
    Transient,
    /// The event or an object could not be understood.
    Data,
    /// Nothing was produced by the invocation.
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to parse \"{key}\": {source}")]
    Parse {
        key: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("abort process because buffer is empty")]
    EmptyBuffer,
}

impl PipelineError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Config(_) => ErrorCategory::Configuration,
            PipelineError::Format(FormatError::InvalidFormat(_)) => ErrorCategory::Data,
            PipelineError::Format(_) => ErrorCategory::Configuration,
            PipelineError::Event(_) | PipelineError::Parse { .. } => ErrorCategory::Data,
            PipelineError::Fetch(_) | PipelineError::Delivery(_) => ErrorCategory::Transient,
            PipelineError::EmptyBuffer => ErrorCategory::Empty,
        }
    }

    /// Short name reported as `errorType` to the function runtime.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "ConfigurationError",
            PipelineError::Event(_) => "InvalidEvent",
            PipelineError::Fetch(_) => "FetchError",
            PipelineError::Format(FormatError::InvalidFormat(_)) => "InvalidFormat",
            PipelineError::Format(_) => "FormatError",
            PipelineError::Parse { .. } => "ParseError",
            PipelineError::Delivery(_) => "DeliveryError",
            PipelineError::EmptyBuffer => "EmptyBuffer",
        }
    }
}
