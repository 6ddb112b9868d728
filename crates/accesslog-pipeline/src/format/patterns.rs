// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line grammars of the supported access-log formats.
//!
//! Every grammar is a regular expression whose named captures, in order, are the field
//! labels of the format. Trailing fields that older log versions lack are optional captures.

/// Apache common log format, optionally followed by the combined format's referer and
/// user agent.
pub const CLF: &str = concat!(
    r#"^(?P<remote_host>\S+) (?P<remote_logname>\S+) (?P<remote_user>\S+) "#,
    r#"\[(?P<datetime>[^\]]+)\] "#,
    r#""(?P<method>\S+) (?P<request_uri>\S+) (?P<protocol>[^"]*)" "#,
    r#"(?P<status>\S+) (?P<size>\S+)"#,
    r#"(?: "(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)")?"#,
);

/// [`CLF`] prefixed with the virtual host that served the request.
pub const CLF_VHOST: &str = concat!(
    r#"^(?P<virtual_host>\S+) "#,
    r#"(?P<remote_host>\S+) (?P<remote_logname>\S+) (?P<remote_user>\S+) "#,
    r#"\[(?P<datetime>[^\]]+)\] "#,
    r#""(?P<method>\S+) (?P<request_uri>\S+) (?P<protocol>[^"]*)" "#,
    r#"(?P<status>\S+) (?P<size>\S+)"#,
    r#"(?: "(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)")?"#,
);

/// Object storage server access log.
pub const S3: &str = concat!(
    r#"^(?P<bucket_owner>\S+) (?P<bucket>\S+) \[(?P<time>[^\]]+)\] "#,
    r#"(?P<remote_ip>\S+) (?P<requester>\S+) (?P<request_id>\S+) (?P<operation>\S+) "#,
    r#"(?P<key>\S+) "(?P<request_uri>[^"]*)" (?P<http_status>\S+) (?P<error_code>\S+) "#,
    r#"(?P<bytes_sent>\S+) (?P<object_size>\S+) (?P<total_time>\S+) "#,
    r#"(?P<turn_around_time>\S+) "(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)" "#,
    r#"(?P<version_id>\S+)"#,
    r#"(?: (?P<host_id>\S+) (?P<signature_version>\S+) (?P<cipher_suite>\S+) "#,
    r#"(?P<authentication_type>\S+) (?P<host_header>\S+)"#,
    r#"(?: (?P<tls_version>\S+))?(?: (?P<access_point_arn>\S+))?(?: (?P<acl_required>\S+))?)?"#,
);

/// CDN standard log fields, tab separated.
pub const CF_LABELS: [&str; 33] = [
    "date",
    "time",
    "x_edge_location",
    "sc_bytes",
    "c_ip",
    "cs_method",
    "cs_host",
    "cs_uri_stem",
    "sc_status",
    "cs_referer",
    "cs_user_agent",
    "cs_uri_query",
    "cs_cookie",
    "x_edge_result_type",
    "x_edge_request_id",
    "x_host_header",
    "cs_protocol",
    "cs_bytes",
    "time_taken",
    "x_forwarded_for",
    "ssl_protocol",
    "ssl_cipher",
    "x_edge_response_result_type",
    "cs_protocol_version",
    "fle_status",
    "fle_encrypted_fields",
    "c_port",
    "time_to_first_byte",
    "x_edge_detailed_result_type",
    "sc_content_type",
    "sc_content_len",
    "sc_range_start",
    "sc_range_end",
];

/// Application load balancer access log.
pub const ALB: &str = concat!(
    r#"^(?P<type>\S+) (?P<time>\S+) (?P<elb>\S+) (?P<client_port>\S+) (?P<target_port>\S+) "#,
    r#"(?P<request_processing_time>\S+) (?P<target_processing_time>\S+) "#,
    r#"(?P<response_processing_time>\S+) (?P<elb_status_code>\S+) "#,
    r#"(?P<target_status_code>\S+) (?P<received_bytes>\S+) (?P<sent_bytes>\S+) "#,
    r#""(?P<request>[^"]*)" "(?P<user_agent>[^"]*)" (?P<ssl_cipher>\S+) "#,
    r#"(?P<ssl_protocol>\S+) (?P<target_group_arn>\S+) "(?P<trace_id>[^"]*)" "#,
    r#""(?P<domain_name>[^"]*)" "(?P<chosen_cert_arn>[^"]*)" "#,
    r#"(?P<matched_rule_priority>\S+) (?P<request_creation_time>\S+) "#,
    r#""(?P<actions_executed>[^"]*)" "(?P<redirect_url>[^"]*)" "(?P<error_reason>[^"]*)""#,
    r#"(?: "(?P<target_port_list>[^"]*)" "(?P<target_status_code_list>[^"]*)")?"#,
    r#"(?: "(?P<classification>[^"]*)" "(?P<classification_reason>[^"]*)")?"#,
    r#"(?: (?P<conn_trace_id>\S+))?"#,
);

/// Network load balancer TLS access log fields, space separated.
pub const NLB_LABELS: [&str; 22] = [
    "type",
    "version",
    "time",
    "elb",
    "listener",
    "client_port",
    "destination_port",
    "connection_time",
    "tls_handshake_time",
    "received_bytes",
    "sent_bytes",
    "incoming_tls_alert",
    "chosen_cert_arn",
    "chosen_cert_serial",
    "tls_cipher",
    "tls_protocol_version",
    "tls_named_group",
    "domain_name",
    "alpn_fe_protocol",
    "alpn_be_protocol",
    "alpn_client_preference_list",
    "tls_connection_creation_time",
];

/// Classic load balancer access log.
pub const CLB: &str = concat!(
    r#"^(?P<time>\S+) (?P<elb>\S+) (?P<client_port>\S+) (?P<backend_port>\S+) "#,
    r#"(?P<request_processing_time>\S+) (?P<backend_processing_time>\S+) "#,
    r#"(?P<response_processing_time>\S+) (?P<elb_status_code>\S+) "#,
    r#"(?P<backend_status_code>\S+) (?P<received_bytes>\S+) (?P<sent_bytes>\S+) "#,
    r#""(?P<request>[^"]*)" "(?P<user_agent>[^"]*)""#,
    r#"(?: (?P<ssl_cipher>\S+) (?P<ssl_protocol>\S+))?"#,
);

/// Builds an anchored grammar of `labels` separated by `separator`, each field matching
/// `field`. Extra trailing fields appended by newer log versions are ignored.
#[must_use]
pub fn delimited(labels: &[&str], field: &str, separator: &str) -> String {
    let fields = labels
        .iter()
        .map(|label| format!("(?P<{label}>{field})"))
        .collect::<Vec<String>>()
        .join(separator);
    format!("^{fields}(?:{separator}.*)?$")
}
