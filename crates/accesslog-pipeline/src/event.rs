// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of the triggering event.
//!
//! The function is fed by a queue; every queue message body is an object-storage
//! notification listing one or more created objects:
//!
//! ```json
//! {"Records":[{"messageId":"...","body":"{\"Records\":[{\"s3\":{\"bucket\":{\"name\":\"logs\"},\"object\":{\"key\":\"my-alb/AWSLogs/...\"}}}]}"}]}
//! ```

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("failed to decode event: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("failed to decode message {message_id}: {source}")]
    Body {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Pointer to one stored log object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
    /// First `/` separated segment of the key, names the resource that wrote the log
    pub source_name: String,
}

impl ObjectReference {
    #[must_use]
    pub fn new(bucket: &str, key: &str) -> Self {
        let source_name = key.split('/').next().unwrap_or_default();
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source_name: source_name.to_string(),
        }
    }
}

/// Ordered objects referenced by one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestEvent {
    objects: Vec<ObjectReference>,
}

#[derive(Deserialize)]
struct QueueEvent {
    #[serde(rename = "Records", default)]
    records: Vec<QueueMessage>,
}

#[derive(Deserialize)]
struct QueueMessage {
    #[serde(rename = "messageId", default)]
    message_id: String,
    body: String,
}

#[derive(Deserialize)]
struct StorageNotification {
    // absent in test notifications
    #[serde(rename = "Records", default)]
    records: Vec<StorageRecord>,
}

#[derive(Deserialize)]
struct StorageRecord {
    s3: StorageEntity,
}

#[derive(Deserialize)]
struct StorageEntity {
    bucket: NamedBucket,
    object: StoredObject,
}

#[derive(Deserialize)]
struct NamedBucket {
    name: String,
}

#[derive(Deserialize)]
struct StoredObject {
    key: String,
}

impl IngestEvent {
    #[must_use]
    pub fn new(objects: Vec<ObjectReference>) -> Self {
        Self { objects }
    }

    /// Flattens a queue batch of storage notifications, keeping message order and the
    /// record order inside each message.
    pub fn from_queue_payload(payload: &[u8]) -> Result<Self, EventError> {
        let event: QueueEvent = serde_json::from_slice(payload).map_err(EventError::Payload)?;
        let mut objects = Vec::new();
        for message in event.records {
            let notification: StorageNotification =
                serde_json::from_str(&message.body).map_err(|source| EventError::Body {
                    message_id: message.message_id.clone(),
                    source,
                })?;
            objects.extend(
                notification
                    .records
                    .iter()
                    .map(|record| ObjectReference::new(&record.s3.bucket.name, &record.s3.object.key)),
            );
        }
        Ok(Self { objects })
    }

    #[must_use]
    pub fn objects(&self) -> &[ObjectReference] {
        &self.objects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
