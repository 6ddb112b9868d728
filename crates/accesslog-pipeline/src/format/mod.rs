// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Supported log formats and the per-format parsing policy.
//!
//! | code   | log                                      | policy                       |
//! |--------|------------------------------------------|------------------------------|
//! | `clf`  | Apache common / combined                 | drop health-check requests   |
//! | `clfv` | Apache common / combined with vhost      | drop health-check requests   |
//! | `s3`   | object storage server access log         |                              |
//! | `cf`   | CDN standard log (tab separated)         | skip the two header rows     |
//! | `alb`  | application load balancer                |                              |
//! | `nlb`  | network load balancer (TLS listeners)    |                              |
//! | `clb`  | classic load balancer                    |                              |

pub mod filter;
pub mod parser;
pub mod patterns;

use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use crate::buffer::AccumulationBuffer;
use crate::normalizer::RecordNormalizer;
use parser::{LineParser, ParseError, ParseSummary, ParserConfig};

/// Drops the load balancer's synthetic health-check traffic.
pub const HEALTH_CHECK_FILTER: &str = "user_agent !~* ^ELB-HealthChecker";

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid resource type: \"{0}\"")]
    InvalidFormat(String),

    #[error("invalid filter {0}")]
    InvalidFilter(String),

    #[error("invalid grammar: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    Clf,
    ClfVhost,
    S3,
    CloudFront,
    Alb,
    Nlb,
    Clb,
}

impl LogFormat {
    pub const ALL: [LogFormat; 7] = [
        LogFormat::Clf,
        LogFormat::ClfVhost,
        LogFormat::S3,
        LogFormat::CloudFront,
        LogFormat::Alb,
        LogFormat::Nlb,
        LogFormat::Clb,
    ];

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            LogFormat::Clf => "clf",
            LogFormat::ClfVhost => "clfv",
            LogFormat::S3 => "s3",
            LogFormat::CloudFront => "cf",
            LogFormat::Alb => "alb",
            LogFormat::Nlb => "nlb",
            LogFormat::Clb => "clb",
        }
    }

    #[must_use]
    pub fn pattern(&self) -> Cow<'static, str> {
        match self {
            LogFormat::Clf => Cow::Borrowed(patterns::CLF),
            LogFormat::ClfVhost => Cow::Borrowed(patterns::CLF_VHOST),
            LogFormat::S3 => Cow::Borrowed(patterns::S3),
            LogFormat::CloudFront => {
                Cow::Owned(patterns::delimited(&patterns::CF_LABELS, r"[^\t]*", r"\t"))
            }
            LogFormat::Alb => Cow::Borrowed(patterns::ALB),
            LogFormat::Nlb => Cow::Owned(patterns::delimited(&patterns::NLB_LABELS, r"\S+", " ")),
            LogFormat::Clb => Cow::Borrowed(patterns::CLB),
        }
    }

    #[must_use]
    pub fn parser_config(&self) -> ParserConfig {
        match self {
            LogFormat::Clf | LogFormat::ClfVhost => ParserConfig {
                filters: vec![HEALTH_CHECK_FILTER.to_string()],
                skip_lines: vec![],
            },
            // "#Version" and "#Fields" rows
            LogFormat::CloudFront => ParserConfig {
                filters: vec![],
                skip_lines: vec![1, 2],
            },
            _ => ParserConfig::default(),
        }
    }
}

impl FromStr for LogFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogFormat::ALL
            .into_iter()
            .find(|format| format.code() == s)
            .ok_or_else(|| FormatError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parser and normalizer selected for one object.
#[derive(Debug)]
pub struct FormatAdapter {
    format: LogFormat,
    parser: LineParser,
    normalizer: RecordNormalizer,
}

impl FormatAdapter {
    /// Selects the rules for format `code`, tagging records with `source_name`.
    pub fn build(source_name: &str, code: &str) -> Result<Self, FormatError> {
        let format = code.parse::<LogFormat>()?;
        let parser = LineParser::new(&format.pattern(), &format.parser_config())?;
        Ok(FormatAdapter {
            format,
            parser,
            normalizer: RecordNormalizer::new(format.code(), source_name),
        })
    }

    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        self.parser.labels()
    }

    pub fn parse<R: BufRead>(
        &mut self,
        reader: R,
        source: &str,
        buffer: &mut AccumulationBuffer,
    ) -> Result<ParseSummary, ParseError> {
        self.parser
            .parse(reader, source, &mut self.normalizer, buffer)
    }
}
