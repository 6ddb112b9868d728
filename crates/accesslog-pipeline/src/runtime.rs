// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client for the function runtime HTTP API.
//!
//! The function polls `GET /2018-06-01/runtime/invocation/next` for work, runs the pipeline
//! on the payload and posts either a response or an error for the request id before polling
//! again. Failed invocations are reported and left to the queue for redelivery.

use std::env;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info_span, Instrument};

use crate::error::PipelineError;
use crate::pipeline::{InvocationSummary, Pipeline};

const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";
const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to get value from environment variable \"AWS_LAMBDA_RUNTIME_API\"")]
    MissingApi,

    #[error("runtime API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("runtime API returned status {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("runtime API returned an invocation without a request id")]
    MissingRequestId,
}

/// One pending invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub request_id: String,
    pub payload: Bytes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error_message: String,
    error_type: &'a str,
}

impl<'a> From<&'a PipelineError> for ErrorBody<'a> {
    fn from(error: &'a PipelineError) -> Self {
        ErrorBody {
            error_message: error.to_string(),
            error_type: error.error_type(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: reqwest::Client,
    base_url: String,
}

impl RuntimeClient {
    /// `api` is the `host:port` of the runtime API.
    #[must_use]
    pub fn new(client: reqwest::Client, api: &str) -> Self {
        RuntimeClient {
            client,
            base_url: format!("http://{api}/{API_VERSION}/runtime"),
        }
    }

    /// Connects to the API named by `AWS_LAMBDA_RUNTIME_API`. Polling for the next invocation
    /// blocks until one arrives, so the client carries no request timeout.
    pub fn from_env() -> Result<Self, RuntimeError> {
        let api = env::var(RUNTIME_API_VAR).map_err(|_| RuntimeError::MissingApi)?;
        Ok(Self::new(reqwest::Client::new(), &api))
    }

    pub async fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
        let path = "invocation/next";
        let resp = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .send()
            .await?;
        let resp = check_status(path, resp)?;

        let request_id = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(RuntimeError::MissingRequestId)?;
        let payload = resp.bytes().await?;
        Ok(Invocation {
            request_id,
            payload,
        })
    }

    pub async fn send_response(
        &self,
        request_id: &str,
        summary: &InvocationSummary,
    ) -> Result<(), RuntimeError> {
        let path = format!("invocation/{request_id}/response");
        let resp = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .json(summary)
            .send()
            .await?;
        check_status(&path, resp).map(|_| ())
    }

    pub async fn send_error(
        &self,
        request_id: &str,
        error: &PipelineError,
    ) -> Result<(), RuntimeError> {
        self.post_error(&format!("invocation/{request_id}/error"), error)
            .await
    }

    /// Reports a failure that happened before the first invocation could be served.
    pub async fn init_error(&self, error: &PipelineError) -> Result<(), RuntimeError> {
        self.post_error("init/error", error).await
    }

    async fn post_error(&self, path: &str, error: &PipelineError) -> Result<(), RuntimeError> {
        let body = ErrorBody::from(error);
        let resp = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .header(ERROR_TYPE_HEADER, body.error_type)
            .json(&body)
            .send()
            .await?;
        check_status(path, resp).map(|_| ())
    }

    /// Serves one invocation end to end.
    ///
    /// Only a failure to obtain the invocation is returned. A result that cannot be posted is
    /// logged; the runtime then times the invocation out and the queue redelivers it.
    pub async fn handle_next(&self, pipeline: &Pipeline) -> Result<(), RuntimeError> {
        let invocation = self.next_invocation().await?;
        let span = info_span!("invocation", request_id = %invocation.request_id);
        async {
            let reported = match pipeline.handle_payload(&invocation.payload).await {
                Ok(summary) => {
                    debug!("Invocation succeeded");
                    self.send_response(&invocation.request_id, &summary).await
                }
                Err(e) => {
                    error!("Invocation failed: {e}");
                    self.send_error(&invocation.request_id, &e).await
                }
            };
            if let Err(e) = reported {
                error!("Failed to report invocation result: {e}");
            }
        }
        .instrument(span)
        .await;
        Ok(())
    }

    /// Serves invocations until polling for the next one fails.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<(), RuntimeError> {
        loop {
            self.handle_next(pipeline).await?;
        }
    }
}

fn check_status(path: &str, resp: reqwest::Response) -> Result<reqwest::Response, RuntimeError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(RuntimeError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        })
    }
}
