// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Access-log ingestion pipeline.
//!
//! An invocation receives a batch of object-storage notifications, fetches every referenced
//! access-log object, parses each line with the grammar of the object's declared log format,
//! and normalizes it into one JSON object per line. All normalized lines of the invocation are
//! accumulated in order and finally re-batched into chunks that respect both the record-count
//! and the byte-size ceiling of the delivery stream.
//!
//! ```text
//!   event ─> fetch ─> decompress ─> resolve ─> parse + normalize ─> buffer
//!                                                                      │
//!                                          deliver <─ chunk <──────────┘
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod audit;
pub mod buffer;
pub mod chunker;
pub mod config;
pub mod decompress;
pub mod delivery;
pub mod error;
pub mod event;
pub mod fetch;
pub mod format;
pub mod http;
pub mod logger;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod runtime;
