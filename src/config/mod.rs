// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Validated runtime configuration

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::vision::DescriberConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("invalid listen address {addr}: {reason}")]
    InvalidListenAddr { addr: String, reason: String },

    #[error("invalid {name} URL '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarratorBackend {
    Gtts,
    OpenAi,
}

impl fmt::Display for NarratorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarratorBackend::Gtts => write!(f, "gtts"),
            NarratorBackend::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Clone)]
pub struct VisionSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub describer: DescriberConfig,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub backend: NarratorBackend,
    pub language: String,
    pub tld: String,
    pub slow: bool,
    pub timeout: Duration,
    pub openai_model: String,
    pub openai_voice: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub vision: VisionSettings,
    pub speech: SpeechSettings,
    /// `*` allows any origin
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

// The API key must never reach the logs
impl fmt::Debug for VisionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("describer", &self.describer)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("listen_addr", &self.listen_addr)
            .field("vision", &self.vision)
            .field("speech", &self.speech)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AppConfig {
    pub fn allows_any_origin(&self) -> bool {
        allows_any_origin(&self.cors_allowed_origins)
    }
}

/// An empty list or one containing `*` permits every origin
pub fn allows_any_origin(origins: &[String]) -> bool {
    origins.is_empty() || origins.iter().any(|o| o == "*")
}

/// Strip surrounding whitespace and quotes from a secret taken from the environment
///
/// Returns `None` when nothing is left.
pub fn sanitize_api_key(raw: &str) -> Option<String> {
    let key = raw.trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace());
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

pub fn parse_listen_addr(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidListenAddr {
            addr,
            reason: e.to_string(),
        })
}

pub fn validate_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

pub fn check_range(name: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Split a comma separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
