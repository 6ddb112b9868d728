// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log line formatter for the function's log stream.
//!
//! Diagnostic events are prefixed so they stand apart from audit lines:
//!
//! ```text
//! ACCESSLOG | WARN | invocation{request_id="8476a536"}: Record of 5242881 bytes exceeds ...
//! ```
//!
//! Events on the [`AUDIT_TARGET`] are written as their bare message, which is a JSON object:
//!
//! ```text
//! {"key":"my-alb/AWSLogs/123456789012/elasticloadbalancing/file.log.gz"}
//! ```

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;

use crate::audit::AUDIT_TARGET;

/// `EnvFilter` directives for `log_level`. Noisy HTTP crates are silenced and audit lines
/// stay enabled whatever the level.
#[must_use]
pub fn filter_directives(log_level: &str) -> String {
    format!("h2=off,hyper=off,rustls=off,reqwest=off,{log_level},{AUDIT_TARGET}=info")
}

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() == AUDIT_TARGET {
            ctx.field_format().format_fields(writer.by_ref(), event)?;
            return writeln!(writer);
        }

        write!(&mut writer, "ACCESSLOG | {} | ", metadata.level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
