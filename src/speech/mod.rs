// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Speech synthesis for generated descriptions
//!
//! Two narrators are available:
//! - Google Translate speech (default, no credentials)
//! - OpenAI-compatible `/v1/audio/speech`

pub mod gtts;
pub mod narrator;
pub mod openai;
pub mod tokenizer;

pub use gtts::{GttsConfig, GttsNarrator};
pub use narrator::{
    AudioClip, NarrationError, Narrator, DEFAULT_AUDIO_FILE_NAME, MPEG_AUDIO_MIME,
};
pub use openai::{OpenAiSpeechConfig, OpenAiSpeechNarrator};
pub use tokenizer::{split_for_speech, MAX_CHUNK_CHARS};
