// src/cli/serve.rs — Composition root for the API server
//
// Everything stateful (tracker, sink, provider) is constructed exactly
// once here and handed down; nothing else in the crate owns a global.

use std::sync::Arc;

use crate::analytics::sink::{ChannelSink, LogSink};
use crate::analytics::{AnalyticsTracker, EventSink};
use crate::api::{self, ApiState};
use crate::infra::config::Config;
use crate::infra::clock::SystemClock;
use crate::infra::errors::StorymillError;
use crate::provider::openai::OpenAiProvider;
use crate::store::collections::Collections;
use crate::store::profiles::ProfileStore;

pub async fn run_serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .ok_or(StorymillError::NoApiKey)?;

    let client = reqwest::Client::new();

    let sink: Arc<dyn EventSink> = match (config.analytics.enabled, &config.analytics.endpoint) {
        (true, Some(endpoint)) => Arc::new(ChannelSink::spawn(client.clone(), endpoint.clone())),
        _ => Arc::new(LogSink),
    };

    let tracker = Arc::new(AnalyticsTracker::new(sink));
    let provider = Arc::new(OpenAiProvider::new(
        client.clone(),
        config.provider.base_url.clone(),
        api_key,
        config.provider.text_model.clone(),
        config.provider.image_model.clone(),
    ));
    let profiles = Arc::new(ProfileStore::new(
        client,
        config.database.base_url.clone(),
        Collections::for_env(config.environment),
        Arc::new(SystemClock),
    ));

    let mut server = config.server.clone();
    if let Some(port) = port {
        server.port = port;
    }

    tracing::info!(environment = %config.environment, "starting storymill");
    api::start_server(
        &server,
        ApiState {
            tracker,
            provider,
            profiles,
        },
    )
    .await
}
