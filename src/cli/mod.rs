// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::config::{
    check_range, parse_listen_addr, parse_origins, sanitize_api_key, validate_base_url,
    AppConfig, ConfigError, NarratorBackend, SpeechSettings, VisionSettings,
};
use crate::vision::{
    DescriberConfig, DEFAULT_DESCRIBE_MAX_TOKENS, DEFAULT_DESCRIBE_PROMPT, DEFAULT_MAX_IMAGE_SIZE,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarratorArg {
    /// Google Translate speech
    Gtts,
    /// OpenAI-compatible /v1/audio/speech
    Openai,
}

impl From<NarratorArg> for NarratorBackend {
    fn from(arg: NarratorArg) -> Self {
        match arg {
            NarratorArg::Gtts => NarratorBackend::Gtts,
            NarratorArg::Openai => NarratorBackend::OpenAi,
        }
    }
}

/// SightSync node: speaks a description of an uploaded photo
#[derive(Parser, Debug)]
#[command(name = "sightsync-node")]
#[command(version)]
#[command(about = "Describes uploaded photos and returns the description as speech", long_about = None)]
pub struct Cli {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// API key for the vision service (quotes and whitespace are stripped)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com")]
    pub openai_base_url: String,

    /// Vision model used to describe images
    #[arg(long, env = "VISION_MODEL", default_value = "gpt-4o-mini")]
    pub vision_model: String,

    /// Instruction sent with every image
    #[arg(long, env = "VISION_PROMPT", default_value = DEFAULT_DESCRIBE_PROMPT)]
    pub vision_prompt: String,

    /// Maximum tokens the vision model may generate
    #[arg(long, env = "VISION_MAX_TOKENS", default_value_t = DEFAULT_DESCRIBE_MAX_TOKENS)]
    pub vision_max_tokens: u32,

    /// Timeout for the vision call in seconds
    #[arg(long, env = "VISION_TIMEOUT_SECS", default_value_t = 60)]
    pub vision_timeout_secs: u64,

    /// JPEG quality used when re-encoding uploads (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value_t = 85)]
    pub jpeg_quality: u8,

    /// Speech backend
    #[arg(long, env = "NARRATOR", value_enum, default_value_t = NarratorArg::Gtts)]
    pub narrator: NarratorArg,

    /// Spoken language
    #[arg(long, env = "TTS_LANGUAGE", default_value = "en")]
    pub tts_language: String,

    /// Top-level domain of the translate host (gtts only)
    #[arg(long, env = "TTS_TLD", default_value = "com")]
    pub tts_tld: String,

    /// Read more slowly
    #[arg(long, env = "TTS_SLOW")]
    pub tts_slow: bool,

    /// Timeout for each speech request in seconds
    #[arg(long, env = "TTS_TIMEOUT_SECS", default_value_t = 30)]
    pub tts_timeout_secs: u64,

    /// Speech model (openai only)
    #[arg(long, env = "TTS_MODEL", default_value = "tts-1")]
    pub tts_model: String,

    /// Voice (openai only)
    #[arg(long, env = "TTS_VOICE", default_value = "alloy")]
    pub tts_voice: String,

    /// Comma separated list of allowed origins, `*` for any
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", default_value = "*")]
    pub cors_allowed_origins: String,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    pub max_upload_bytes: usize,
}

impl Cli {
    /// Validate the arguments and build the runtime configuration
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .and_then(sanitize_api_key)
            .ok_or(ConfigError::MissingApiKey)?;

        let listen_addr = parse_listen_addr(&self.host, self.port)?;
        let base_url = validate_base_url("OPENAI_BASE_URL", &self.openai_base_url)?;

        check_range("VISION_MAX_TOKENS", self.vision_max_tokens as u64, 1, 4096)?;
        check_range("VISION_TIMEOUT_SECS", self.vision_timeout_secs, 1, 600)?;
        check_range("TTS_TIMEOUT_SECS", self.tts_timeout_secs, 1, 600)?;
        check_range("JPEG_QUALITY", self.jpeg_quality as u64, 1, 100)?;
        check_range("MAX_UPLOAD_BYTES", self.max_upload_bytes as u64, 1024, 100 * 1024 * 1024)?;

        if self.vision_prompt.trim().is_empty() {
            return Err(ConfigError::Empty("VISION_PROMPT"));
        }
        if self.vision_model.trim().is_empty() {
            return Err(ConfigError::Empty("VISION_MODEL"));
        }
        if self.tts_language.trim().is_empty() {
            return Err(ConfigError::Empty("TTS_LANGUAGE"));
        }

        Ok(AppConfig {
            listen_addr,
            vision: VisionSettings {
                base_url,
                api_key,
                model: self.vision_model,
                describer: DescriberConfig {
                    prompt: self.vision_prompt,
                    max_tokens: self.vision_max_tokens,
                    jpeg_quality: self.jpeg_quality,
                },
                timeout: Duration::from_secs(self.vision_timeout_secs),
            },
            speech: SpeechSettings {
                backend: self.narrator.into(),
                language: self.tts_language,
                tld: self.tts_tld,
                slow: self.tts_slow,
                timeout: Duration::from_secs(self.tts_timeout_secs),
                openai_model: self.tts_model,
                openai_voice: self.tts_voice,
            },
            cors_allowed_origins: parse_origins(&self.cors_allowed_origins),
            max_upload_bytes: self.max_upload_bytes,
        })
    }
}
