// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Translate speech narrator
//!
//! Text is split into chunks of at most 100 characters. Each chunk is sent as a
//! `batchexecute` RPC and the base64 MP3 payload of every response is decoded
//! and appended in order. MP3 frames concatenate into one playable stream.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use reqwest::{header, Client};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

use super::narrator::{AudioClip, NarrationError, Narrator};
use super::tokenizer::{split_for_speech, MAX_CHUNK_CHARS};

const GOOGLE_TTS_RPC: &str = "jQ1olc";
const BATCHEXECUTE_PATH: &str = "/_/TranslateWebserverUi/data/batchexecute";
const REFERER: &str = "http://translate.google.com/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/47.0.2526.106 Safari/537.36";

fn audio_payload_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).expect("audio payload pattern is valid")
    })
}

/// Settings for [`GttsNarrator`]
#[derive(Debug, Clone)]
pub struct GttsConfig {
    /// Scheme and host, e.g. `https://translate.google.com`
    pub base_url: String,
    /// IETF language tag, e.g. `en`
    pub lang: String,
    pub slow: bool,
    /// Timeout for each chunk request
    pub timeout: Duration,
}

impl GttsConfig {
    /// Settings for the public endpoint under `translate.google.<tld>`
    pub fn for_tld(tld: &str, lang: &str, slow: bool, timeout: Duration) -> Self {
        Self {
            base_url: format!("https://translate.google.{}", tld),
            lang: lang.to_string(),
            slow,
            timeout,
        }
    }
}

pub struct GttsNarrator {
    client: Client,
    config: GttsConfig,
}

impl GttsNarrator {
    pub fn new(mut config: GttsConfig) -> Result<Self, NarrationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(NarrationError::Transport)?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        info!(
            "gTTS narrator configured: endpoint={}, lang={}, slow={}",
            config.base_url, config.lang, config.slow
        );

        Ok(Self { client, config })
    }

    async fn synthesize_chunk(&self, index: usize, chunk: &str) -> Result<Vec<u8>, NarrationError> {
        let response = self
            .client
            .post(format!("{}{}", self.config.base_url, BATCHEXECUTE_PATH))
            .header(header::REFERER, REFERER)
            .header(header::USER_AGENT, USER_AGENT)
            .form(&[(
                "f.req",
                package_rpc(chunk, &self.config.lang, self.config.slow),
            )])
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

        let body = response.text().await.map_err(NarrationError::Transport)?;
        let audio = extract_audio(&body, index)?;
        debug!("gTTS chunk {} ({} chars) -> {} bytes", index, chunk.len(), audio.len());
        Ok(audio)
    }
}

#[async_trait]
impl Narrator for GttsNarrator {
    async fn narrate(&self, text: &str) -> Result<AudioClip, NarrationError> {
        let chunks = split_for_speech(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(NarrationError::EmptyText);
        }

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.synthesize_chunk(index, chunk).await?);
        }

        if audio.is_empty() {
            return Err(NarrationError::EmptyAudio);
        }

        info!(
            "gTTS narration complete: {} chunks, {} bytes",
            chunks.len(),
            audio.len()
        );
        Ok(AudioClip::mpeg(audio))
    }

    fn backend(&self) -> &'static str {
        "gtts"
    }
}

/// Build the `f.req` form value for one chunk
fn package_rpc(text: &str, lang: &str, slow: bool) -> String {
    let speed = if slow {
        serde_json::Value::Bool(true)
    } else {
        serde_json::Value::Null
    };
    let parameter = serde_json::json!([text, lang, speed, "null"]).to_string();
    serde_json::json!([[[GOOGLE_TTS_RPC, parameter, null, "generic"]]]).to_string()
}

/// Find and decode the base64 MP3 payload in a `batchexecute` response
fn extract_audio(body: &str, chunk: usize) -> Result<Vec<u8>, NarrationError> {
    let pattern = audio_payload_pattern();
    for line in body.lines() {
        if !line.contains(GOOGLE_TTS_RPC) {
            continue;
        }
        if let Some(captures) = pattern.captures(line) {
            return Ok(STANDARD.decode(&captures[1])?);
        }
    }
    Err(NarrationError::MissingAudio { chunk })
}
