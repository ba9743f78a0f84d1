// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Narrator backed by an OpenAI-compatible `/v1/audio/speech` endpoint

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::info;

use super::narrator::{AudioClip, NarrationError, Narrator};

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f32,
}

#[derive(Clone)]
pub struct OpenAiSpeechConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub slow: bool,
    pub timeout: Duration,
}

pub struct OpenAiSpeechNarrator {
    client: Client,
    config: OpenAiSpeechConfig,
}

impl OpenAiSpeechNarrator {
    pub fn new(mut config: OpenAiSpeechConfig) -> Result<Self, NarrationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(NarrationError::Transport)?;

        config.endpoint = config.endpoint.trim_end_matches('/').to_string();
        info!(
            "OpenAI speech narrator configured: endpoint={}, model={}, voice={}",
            config.endpoint, config.model, config.voice
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Narrator for OpenAiSpeechNarrator {
    async fn narrate(&self, text: &str) -> Result<AudioClip, NarrationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NarrationError::EmptyText);
        }

        let request = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            response_format: "mp3",
            speed: if self.config.slow { 0.75 } else { 1.0 },
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.config.endpoint))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(NarrationError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await.map_err(NarrationError::Transport)?;
        if audio.is_empty() {
            return Err(NarrationError::EmptyAudio);
        }

        info!("OpenAI speech narration complete: {} bytes", audio.len());
        Ok(AudioClip::mpeg(audio))
    }

    fn backend(&self) -> &'static str {
        "openai"
    }
}
