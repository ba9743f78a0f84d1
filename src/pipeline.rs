// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image → description → speech pipeline
//!
//! Stages run strictly in order and each reports its own error kind so the
//! HTTP layer can tell client mistakes from upstream failures.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info};

use crate::speech::{AudioClip, NarrationError, Narrator};
use crate::vision::{decode_image_bytes, DescribeError, Describer, ImageError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    #[error("description failed: {0}")]
    DescriptionFailed(#[from] DescribeError),

    #[error("narration failed: {0}")]
    NarrationFailed(#[from] NarrationError),

    #[error("image decoding task failed: {0}")]
    DecodeTask(#[source] JoinError),
}

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct Narration {
    pub description: String,
    pub audio: AudioClip,
    pub processing_time_ms: u64,
}

pub struct DescriptionPipeline {
    describer: Arc<dyn Describer>,
    narrator: Arc<dyn Narrator>,
    max_image_bytes: usize,
}

impl DescriptionPipeline {
    pub fn new(
        describer: Arc<dyn Describer>,
        narrator: Arc<dyn Narrator>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            describer,
            narrator,
            max_image_bytes,
        }
    }

    pub fn narrator_backend(&self) -> &'static str {
        self.narrator.backend()
    }

    /// Decode `image_bytes`, describe the picture and speak the description
    ///
    /// Decoding is CPU bound and runs on the blocking pool.
    pub async fn run(&self, image_bytes: Bytes) -> Result<Narration, PipelineError> {
        let start = Instant::now();

        let max_image_bytes = self.max_image_bytes;
        let (image, info) = tokio::task::spawn_blocking(move || {
            decode_image_bytes(&image_bytes, max_image_bytes)
        })
        .await
        .map_err(PipelineError::DecodeTask)??;
        debug!(
            "Decoded image: {}x{}, {:?}, {} bytes",
            info.width, info.height, info.format, info.size_bytes
        );

        let description = self.describer.describe(image).await?;
        info!("Generated description: {}", description);

        let audio = self.narrator.narrate(&description).await?;

        Ok(Narration {
            description,
            audio,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
