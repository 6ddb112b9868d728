// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory object store and delivery sink

use std::collections::HashMap;
use std::sync::Mutex;

use accesslog_pipeline::{
    chunker::Chunk,
    delivery::{DeliveryError, DeliverySink, PutRecordBatchOutput, PutRecordBatchResponseEntry},
    event::ObjectReference,
    fetch::{FetchError, ObjectStore},
};
use bytes::Bytes;

/// Object store serving bodies keyed by object key
#[derive(Default)]
pub struct MemoryStore {
    objects: HashMap<String, Bytes>,
}

impl MemoryStore {
    pub fn with(mut self, key: &str, body: impl Into<Bytes>) -> Self {
        self.objects.insert(key.to_string(), body.into());
        self
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, object: &ObjectReference) -> Result<Bytes, FetchError> {
        self.objects
            .get(&object.key)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                key: object.key.clone(),
                status: 404,
                body: "NoSuchKey".to_string(),
            })
    }
}

/// Sink that keeps every delivered chunk
#[derive(Default)]
pub struct RecordingSink {
    chunks: Mutex<Vec<Chunk>>,
}

impl RecordingSink {
    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks.lock().unwrap().clone()
    }

    /// All delivered bytes, in delivery order
    pub fn delivered(&self) -> Vec<u8> {
        self.chunks()
            .iter()
            .flat_map(|chunk| chunk.data.to_vec())
            .collect()
    }
}

#[async_trait::async_trait]
impl DeliverySink for RecordingSink {
    async fn put_record_batch(&self, chunk: &Chunk) -> Result<PutRecordBatchOutput, DeliveryError> {
        let mut chunks = self.chunks.lock().unwrap();
        chunks.push(chunk.clone());
        Ok(PutRecordBatchOutput {
            failed_put_count: 0,
            encrypted: Some(false),
            request_responses: vec![PutRecordBatchResponseEntry {
                record_id: Some(format!("record-{}", chunks.len())),
                ..PutRecordBatchResponseEntry::default()
            }],
        })
    }
}
