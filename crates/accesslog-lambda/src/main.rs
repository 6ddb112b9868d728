// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process, sync::Arc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use accesslog_pipeline::{
    config::Config,
    delivery::FirehoseSink,
    error::PipelineError,
    fetch::S3ObjectStore,
    http,
    logger::{self, Formatter},
    pipeline::Pipeline,
    runtime::RuntimeClient,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = logger::filter_directives(&log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .event_format(Formatter)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let runtime = match RuntimeClient::from_env() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Unable to reach the function runtime: {e}");
            return;
        }
    };

    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on startup: {e}");
            if let Err(e) = runtime.init_error(&PipelineError::from(e)).await {
                error!("Failed to report initialization error: {e}");
            }
            return;
        }
    };

    let client = http::get_client(&config);
    let store = Arc::new(S3ObjectStore::new(client.clone(), &config.s3_endpoint));
    let sink = Arc::new(FirehoseSink::new(
        client,
        &config.firehose_endpoint,
        &config.stream_name,
    ));
    info!(
        "Forwarding access logs of {} resources to {}",
        config.resources.len(),
        config.stream_name
    );
    let pipeline = Pipeline::new(config, store, sink);

    if let Err(e) = runtime.run(&pipeline).await {
        error!("Runtime loop stopped: {e}");
        process::exit(1);
    }
}
