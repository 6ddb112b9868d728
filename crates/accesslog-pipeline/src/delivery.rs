// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of chunks to the streaming sink.
//!
//! Each chunk goes out as one batch request holding a single record whose data is the raw
//! chunk: many newline-joined JSON lines. There is no retry here; a failed request fails
//! the invocation and the queue redelivers it.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunker::Chunk;

const PUT_RECORD_BATCH_TARGET: &str = "Firehose_20150804.PutRecordBatch";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to send batch: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to encode batch: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unexpected status {status} from delivery stream: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode delivery response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("delivery stream rejected {failed} record(s): {}", .error_code.as_deref().unwrap_or("unknown error"))]
    Rejected {
        failed: u64,
        error_code: Option<String>,
        error_message: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordBatchInput<'a> {
    delivery_stream_name: &'a str,
    records: Vec<BatchRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchRecord {
    data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRecordBatchOutput {
    pub failed_put_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(default)]
    pub request_responses: Vec<PutRecordBatchResponseEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRecordBatchResponseEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Sends `chunk` as one batch request.
    async fn put_record_batch(&self, chunk: &Chunk) -> Result<PutRecordBatchOutput, DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct FirehoseSink {
    client: reqwest::Client,
    endpoint: String,
    stream_name: String,
}

impl FirehoseSink {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: &str, stream_name: &str) -> Self {
        FirehoseSink {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            stream_name: stream_name.to_string(),
        }
    }

    fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>, DeliveryError> {
        let input = PutRecordBatchInput {
            delivery_stream_name: &self.stream_name,
            records: vec![BatchRecord {
                data: STANDARD.encode(&chunk.data),
            }],
        };
        serde_json::to_vec(&input).map_err(DeliveryError::Encode)
    }
}

#[async_trait]
impl DeliverySink for FirehoseSink {
    async fn put_record_batch(&self, chunk: &Chunk) -> Result<PutRecordBatchOutput, DeliveryError> {
        let body = self.encode(chunk)?;
        debug!(
            "Sending chunk of {} records ({} bytes) to {}",
            chunk.records,
            chunk.len(),
            self.stream_name
        );

        let resp = self
            .client
            .post(format!("{}/", self.endpoint))
            .header("X-Amz-Target", PUT_RECORD_BATCH_TARGET)
            .header("Content-Type", CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let output: PutRecordBatchOutput =
            serde_json::from_slice(&resp.bytes().await?).map_err(DeliveryError::Decode)?;
        if output.failed_put_count > 0 {
            let failure = output
                .request_responses
                .iter()
                .find(|entry| entry.error_code.is_some());
            return Err(DeliveryError::Rejected {
                failed: output.failed_put_count,
                error_code: failure.and_then(|entry| entry.error_code.clone()),
                error_message: failure.and_then(|entry| entry.error_message.clone()),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::{Matcher, Server};

    fn chunk(data: &'static [u8], records: usize) -> Chunk {
        Chunk {
            data: Bytes::from_static(data),
            records,
        }
    }

    #[tokio::test]
    async fn test_put_record_batch_sends_chunk_as_single_record() {
        let mut server = Server::new_async().await;
        let expected_data = STANDARD.encode(b"{\"a\":\"1\"}\n{\"a\":\"2\"}\n");
        let mock = server
            .mock("POST", "/")
            .match_header("X-Amz-Target", "Firehose_20150804.PutRecordBatch")
            .match_header("Content-Type", "application/x-amz-json-1.1")
            .match_body(Matcher::Json(serde_json::json!({
                "DeliveryStreamName": "accesslogs",
                "Records": [{"Data": expected_data}]
            })))
            .with_status(200)
            .with_body(r#"{"FailedPutCount":0,"Encrypted":false,"RequestResponses":[{"RecordId":"rec-1"}]}"#)
            .create_async()
            .await;

        let sink = FirehoseSink::new(reqwest::Client::new(), &server.url(), "accesslogs");
        let output = sink
            .put_record_batch(&chunk(b"{\"a\":\"1\"}\n{\"a\":\"2\"}\n", 2))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(output.failed_put_count, 0);
        assert_eq!(output.encrypted, Some(false));
        assert_eq!(
            output.request_responses[0].record_id.as_deref(),
            Some("rec-1")
        );
    }

    #[tokio::test]
    async fn test_failed_put_is_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"FailedPutCount":1,"RequestResponses":[{"ErrorCode":"ServiceUnavailableException","ErrorMessage":"Slow down."}]}"#)
            .create_async()
            .await;

        let sink = FirehoseSink::new(reqwest::Client::new(), &server.url(), "accesslogs");
        let err = sink.put_record_batch(&chunk(b"x\n", 1)).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "delivery stream rejected 1 record(s): ServiceUnavailableException"
        );
        assert!(matches!(
            err,
            DeliveryError::Rejected { failed: 1, error_message: Some(ref m), .. } if m == "Slow down."
        ));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"ResourceNotFoundException"}"#)
            .create_async()
            .await;

        let sink = FirehoseSink::new(reqwest::Client::new(), &server.url(), "missing");
        let err = sink.put_record_batch(&chunk(b"x\n", 1)).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status: 400, ref body } if body.contains("ResourceNotFound")));
    }

    #[tokio::test]
    async fn test_undecodable_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html/>")
            .create_async()
            .await;

        let sink = FirehoseSink::new(reqwest::Client::new(), &server.url(), "accesslogs");
        let err = sink.put_record_batch(&chunk(b"x\n", 1)).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Decode(_)));
    }

    #[test]
    fn test_output_serializes_like_the_service() {
        let output = PutRecordBatchOutput {
            failed_put_count: 0,
            encrypted: None,
            request_responses: vec![PutRecordBatchResponseEntry {
                record_id: Some("rec-1".to_string()),
                ..Default::default()
            }],
        };
        assert_eq!(
            serde_json::to_string(&output).unwrap(),
            r#"{"FailedPutCount":0,"RequestResponses":[{"RecordId":"rec-1"}]}"#
        );
    }
}
