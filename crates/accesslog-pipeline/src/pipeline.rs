// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-invocation orchestration.
//!
//! Objects are processed one at a time, in event order, into a single
//! [`AccumulationBuffer`]. Once every object has been handled the buffer is split into
//! chunks, which are delivered one at a time in split order. Any failure other than an
//! unresolved source aborts the invocation; nothing is checkpointed, a retry starts over.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{self, AuditLine};
use crate::buffer::AccumulationBuffer;
use crate::chunker;
use crate::config::Config;
use crate::decompress;
use crate::delivery::DeliverySink;
use crate::error::PipelineError;
use crate::event::{IngestEvent, ObjectReference};
use crate::fetch::ObjectStore;
use crate::format::FormatAdapter;

const SKIP_REASON: &str = "cannot determine log format";

/// Counters reported back to the runtime for a successful invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvocationSummary {
    pub objects: usize,
    pub skipped: usize,
    pub records: usize,
    pub bytes: usize,
    pub chunks: usize,
}

pub struct Pipeline {
    config: Arc<Config>,
    store: Arc<dyn ObjectStore>,
    sink: Arc<dyn DeliverySink>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ObjectStore>,
        sink: Arc<dyn DeliverySink>,
    ) -> Self {
        Pipeline {
            config,
            store,
            sink,
        }
    }

    /// Decodes a queue payload and handles the event it carries.
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<InvocationSummary, PipelineError> {
        let event = IngestEvent::from_queue_payload(payload)?;
        self.handle(&event).await
    }

    pub async fn handle(&self, event: &IngestEvent) -> Result<InvocationSummary, PipelineError> {
        let mut summary = InvocationSummary::default();
        let mut buffer = AccumulationBuffer::default();

        debug!("Handling event with {} objects", event.len());
        for object in event.objects() {
            summary.objects += 1;
            if !self.process_object(object, &mut buffer).await? {
                summary.skipped += 1;
            }
        }

        if buffer.is_empty() {
            warn!(
                "No records produced from {} objects ({} skipped)",
                summary.objects, summary.skipped
            );
            return Err(PipelineError::EmptyBuffer);
        }

        summary.records = buffer.record_count();
        summary.bytes = buffer.len();
        let data = buffer.freeze();
        let chunks = chunker::split(&data, &self.config.chunk_limits);
        debug!(
            "Split {} records ({} bytes) into {} chunks",
            summary.records,
            summary.bytes,
            chunks.len()
        );

        for chunk in &chunks {
            let output = self.sink.put_record_batch(chunk).await?;
            audit::emit(&AuditLine::Delivery(&output));
            summary.chunks += 1;
        }

        info!(
            "Delivered {} records in {} chunks from {} objects",
            summary.records, summary.chunks, summary.objects
        );
        Ok(summary)
    }

    /// Fetches, parses and appends one object. Returns `false` when the object was skipped
    /// because its source has no declared format.
    async fn process_object(
        &self,
        object: &ObjectReference,
        buffer: &mut AccumulationBuffer,
    ) -> Result<bool, PipelineError> {
        let body = self.store.get_object(object).await?;
        audit::emit(&AuditLine::Object { key: &object.key });

        let Some(code) = self.config.resources.resolve(&object.source_name) else {
            audit::emit(&AuditLine::Skip {
                skip: &object.source_name,
                key: &object.key,
                reason: SKIP_REASON,
            });
            return Ok(false);
        };

        let mut adapter = FormatAdapter::build(&object.source_name, code)?;
        let summary = {
            let reader = decompress::open(&body);
            adapter
                .parse(reader, &object.key, buffer)
                .map_err(|source| PipelineError::Parse {
                    key: object.key.clone(),
                    source,
                })?
        };
        if summary.unmatched > 0 {
            warn!(
                "{} of {} lines in {} did not match the {} format",
                summary.unmatched,
                summary.total,
                object.key,
                adapter.format()
            );
        }
        audit::emit(&AuditLine::Parse(&summary));
        Ok(true)
    }
}
