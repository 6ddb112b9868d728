// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process-wide configuration, read from the environment once at start-up.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::chunker::{ChunkLimits, DEFAULT_MAX_BYTES_PER_CHUNK, DEFAULT_MAX_RECORDS_PER_CHUNK};
use crate::resolver::ResourceResolver;

/// Hard per-request limits of the delivery stream's batch API.
pub const DELIVERY_MAX_RECORDS: usize = 500;
pub const DELIVERY_MAX_BYTES: usize = 4 * 1024 * 1024;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to get value from environment variable \"{0}\"")]
    MissingVar(&'static str),

    #[error("resource map is empty")]
    EmptyResourceMap,

    #[error("malformed resource map: {0}")]
    MalformedResourceMap(#[source] serde_json::Error),

    #[error("invalid value \"{value}\" for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Source name to log format mapping
    pub resources: ResourceResolver,
    /// Delivery stream receiving the chunks
    pub stream_name: String,
    pub chunk_limits: ChunkLimits,
    pub region: String,
    /// Base URL of the object store, objects are fetched path-style below it
    pub s3_endpoint: String,
    /// Base URL of the delivery stream API
    pub firehose_endpoint: String,
    pub https_proxy: Option<String>,
    /// Timeout for each fetch and delivery request, in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let resources = ResourceResolver::from_json(&required_var("RESOURCE_MAP")?)?;
        let stream_name = required_var("FIREHOSE_STREAM_NAME")?;

        let chunk_limits = ChunkLimits {
            max_records: parse_var("MAX_RECORDS_PER_CHUNK", DEFAULT_MAX_RECORDS_PER_CHUNK)?,
            max_bytes: parse_var("MAX_BYTES_PER_CHUNK", DEFAULT_MAX_BYTES_PER_CHUNK)?,
        };

        let region = env::var("AWS_REGION")
            .ok()
            .filter(|region| !region.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        // The endpoint overrides are mostly used to point the function at local emulators
        let s3_endpoint = env::var("S3_ENDPOINT_URL")
            .unwrap_or_else(|_| format!("https://s3.{region}.amazonaws.com"));
        let firehose_endpoint = env::var("FIREHOSE_ENDPOINT_URL")
            .unwrap_or_else(|_| format!("https://firehose.{region}.amazonaws.com"));

        let config = Config {
            resources,
            stream_name,
            chunk_limits,
            region,
            s3_endpoint: s3_endpoint.trim_end_matches('/').to_string(),
            firehose_endpoint: firehose_endpoint.trim_end_matches('/').to_string(),
            https_proxy: env::var("HTTPS_PROXY").ok(),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks that the chunk limits stay within the delivery stream's hard limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "MAX_RECORDS_PER_CHUNK",
            self.chunk_limits.max_records,
            DELIVERY_MAX_RECORDS,
        )?;
        check_range(
            "MAX_BYTES_PER_CHUNK",
            self.chunk_limits.max_bytes,
            DELIVERY_MAX_BYTES,
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                name,
                value: value.clone(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

fn check_range(name: &'static str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: format!("must be between 1 and {max}"),
        });
    }
    Ok(())
}
