// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use sightsync_node::{
    api::{start_server, AppState},
    cli::Cli,
    config::{AppConfig, NarratorBackend},
    pipeline::DescriptionPipeline,
    speech::{GttsConfig, GttsNarrator, Narrator, OpenAiSpeechConfig, OpenAiSpeechNarrator},
    version,
    vision::{VisionDescriber, VlmClient, VlmClientConfig},
};
use std::{env, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Starting {}", version::get_version_string());
    info!("Build: {}", version::VERSION);
    info!("Features: {}", version::FEATURES.join(", "));
    info!("Configuration: {:?}", config);

    let pipeline = build_pipeline(&config)?;
    info!(
        "Pipeline ready: vision model={}, narrator={}",
        config.vision.model,
        pipeline.narrator_backend()
    );

    start_server(&config, AppState::new(pipeline)).await
}

fn build_pipeline(config: &AppConfig) -> Result<DescriptionPipeline> {
    let client = VlmClient::new(VlmClientConfig {
        endpoint: config.vision.base_url.clone(),
        model_name: config.vision.model.clone(),
        api_key: config.vision.api_key.clone(),
        timeout: config.vision.timeout,
    })
    .context("failed to build vision client")?;
    let describer = Arc::new(VisionDescriber::new(
        client,
        config.vision.describer.clone(),
    ));

    let speech = &config.speech;
    let narrator: Arc<dyn Narrator> = match speech.backend {
        NarratorBackend::Gtts => Arc::new(
            GttsNarrator::new(GttsConfig::for_tld(
                &speech.tld,
                &speech.language,
                speech.slow,
                speech.timeout,
            ))
            .context("failed to build gTTS narrator")?,
        ),
        NarratorBackend::OpenAi => Arc::new(
            OpenAiSpeechNarrator::new(OpenAiSpeechConfig {
                endpoint: config.vision.base_url.clone(),
                api_key: config.vision.api_key.clone(),
                model: speech.openai_model.clone(),
                voice: speech.openai_voice.clone(),
                slow: speech.slow,
                timeout: speech.timeout,
            })
            .context("failed to build OpenAI speech narrator")?,
        ),
    };

    Ok(DescriptionPipeline::new(
        describer,
        narrator,
        config.max_upload_bytes,
    ))
}
