// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text-to-speech abstraction

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// MIME type of every clip produced by the built-in narrators
pub const MPEG_AUDIO_MIME: &str = "audio/mpeg";

/// File name suggested to clients saving the clip
pub const DEFAULT_AUDIO_FILE_NAME: &str = "description.mp3";

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("nothing to narrate: text is empty")]
    EmptyText,

    #[error("speech request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("speech service returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("speech response for chunk {chunk} had no audio payload")]
    MissingAudio { chunk: usize },

    #[error("speech audio payload was not valid base64: {0}")]
    InvalidAudioEncoding(#[from] base64::DecodeError),

    #[error("speech service returned an empty audio body")]
    EmptyAudio,
}

/// Fully buffered synthesized speech
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub mime_type: &'static str,
    pub file_name: &'static str,
}

impl AudioClip {
    /// Wrap MP3 bytes with the default MIME type and file name
    pub fn mpeg(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: MPEG_AUDIO_MIME,
            file_name: DEFAULT_AUDIO_FILE_NAME,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Speaks text aloud
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str) -> Result<AudioClip, NarrationError>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}
