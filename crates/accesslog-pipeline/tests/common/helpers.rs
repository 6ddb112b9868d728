// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use std::io::Write;

use accesslog_pipeline::{
    chunker::ChunkLimits, config::Config, resolver::ResourceResolver,
};
use flate2::{write::GzEncoder, Compression};
use serde_json::{json, Value};

pub const BUCKET: &str = "access-logs-bucket";

pub const ALB_LINE: &str = concat!(
    r#"https 2018-07-02T22:23:00.186641Z app/my-loadbalancer/50dc6c495c0c9188 "#,
    r#"192.168.131.39:2817 10.0.0.1:80 0.086 0.048 0.037 200 200 0 57 "#,
    r#""GET https://www.example.com:443/ HTTP/1.1" "curl/7.46.0" "#,
    r#"ECDHE-RSA-AES128-GCM-SHA256 TLSv1.2 "#,
    r#"arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 "#,
    r#""Root=1-58337281-1d84f3d73c47ec4e58577259" "www.example.com" "#,
    r#""arn:aws:acm:us-east-2:123456789012:certificate/12345678-1234-1234-1234-123456789012" "#,
    r#"1 2018-07-02T22:22:48.364000Z "authenticate,forward" "-" "-" "10.0.0.1:80" "200" "-" "-" TID_1234abcd5678ef90"#,
);

pub const CLF_LINE: &str =
    r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08""#;

pub const CLF_HEALTH_CHECK: &str =
    r#"10.0.0.2 - - [10/Oct/2000:13:55:40 -0700] "GET /health HTTP/1.1" 200 2 "-" "ELB-HealthChecker/2.0""#;

/// `n` copies of `line`, newline terminated
pub fn repeat_line(line: &str, n: usize) -> String {
    (0..n).map(|_| format!("{line}\n")).collect()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn config(resource_map: &str, endpoint: &str, limits: ChunkLimits) -> Config {
    Config {
        resources: ResourceResolver::from_json(resource_map).unwrap(),
        stream_name: "accesslogs".to_string(),
        chunk_limits: limits,
        region: "us-east-1".to_string(),
        s3_endpoint: endpoint.to_string(),
        firehose_endpoint: endpoint.to_string(),
        https_proxy: None,
        request_timeout_secs: 5,
    }
}

/// Queue batch carrying one storage notification per key
pub fn queue_payload(keys: &[&str]) -> Vec<u8> {
    let records: Vec<Value> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let notification = json!({
                "Records": [{
                    "eventSource": "aws:s3",
                    "eventName": "ObjectCreated:Put",
                    "s3": {"bucket": {"name": BUCKET}, "object": {"key": key}}
                }]
            });
            json!({"messageId": format!("message-{i}"), "body": notification.to_string()})
        })
        .collect();
    serde_json::to_vec(&json!({ "Records": records })).unwrap()
}

/// Parses newline-delimited JSON records
pub fn records(data: &[u8]) -> Vec<Value> {
    std::str::from_utf8(data)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
