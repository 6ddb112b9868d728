// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Retrieval of log objects.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::event::ObjectReference;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to get object \"{key}\": {source}")]
    Request {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to get object \"{key}\": status {status}: {body}")]
    Status { key: String, status: u16, body: String },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the raw, possibly compressed, body of `object`.
    async fn get_object(&self, object: &ObjectReference) -> Result<Bytes, FetchError>;
}

/// Object store reached over HTTP with path-style addressing, `GET {endpoint}/{bucket}/{key}`.
///
/// Keys are used as they appear in the notification, which already carries them URL
/// encoded.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: reqwest::Client,
    endpoint: String,
}

impl S3ObjectStore {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        S3ObjectStore {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, object: &ObjectReference) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            object.bucket,
            object.key.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, object: &ObjectReference) -> Result<Bytes, FetchError> {
        let url = self.object_url(object);
        debug!("Fetching {url}");

        let request_error = |source: reqwest::Error| FetchError::Request {
            key: object.key.clone(),
            source,
        };
        let resp = self.client.get(&url).send().await.map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                key: object.key.clone(),
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        resp.bytes().await.map_err(request_error)
    }
}
