// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Accessibility-oriented image description

use async_trait::async_trait;
use image::DynamicImage;
use thiserror::Error;
use tracing::info;

use super::image_utils::{encode_jpeg_data_url, ImageError, DEFAULT_JPEG_QUALITY};
use super::vlm_client::VlmClient;

/// Prompt sent alongside every image
pub const DEFAULT_DESCRIBE_PROMPT: &str = "Describe this image in detail for a visually impaired person. \
Include:\n\
- Main subjects and their positions (use general location for direction (middle, center, top, bottom, horizon, etc.))\n\
- Colors and lighting\n\
- Spatial relationships and distances\n\
- Emotional tone or mood\n\
- Any text visible in the image\n\
Be descriptive but concise.";

/// Output cap for the vision call; keeps narration short
pub const DEFAULT_DESCRIBE_MAX_TOKENS: u32 = 75;

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("failed to prepare image for upload: {0}")]
    Encode(#[from] ImageError),

    #[error("vision request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("vision service returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("vision response could not be parsed: {0}")]
    MalformedResponse(#[source] reqwest::Error),

    #[error("vision response contained no choices")]
    NoChoices,

    #[error("vision response contained an empty description")]
    EmptyDescription,

    #[error("image encoding task failed: {0}")]
    EncodeTask(#[source] tokio::task::JoinError),
}

/// Turns a decoded image into speakable text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, image: DynamicImage) -> Result<String, DescribeError>;
}

/// Tunables for [`VisionDescriber`]
#[derive(Debug, Clone)]
pub struct DescriberConfig {
    pub prompt: String,
    pub max_tokens: u32,
    pub jpeg_quality: u8,
}

impl Default for DescriberConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_DESCRIBE_PROMPT.to_string(),
            max_tokens: DEFAULT_DESCRIBE_MAX_TOKENS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// [`Describer`] backed by a vision language model
pub struct VisionDescriber {
    client: VlmClient,
    config: DescriberConfig,
}

impl VisionDescriber {
    pub fn new(client: VlmClient, config: DescriberConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Describer for VisionDescriber {
    async fn describe(&self, image: DynamicImage) -> Result<String, DescribeError> {
        // Scaling and JPEG encoding are CPU bound
        let quality = self.config.jpeg_quality;
        let data_url = tokio::task::spawn_blocking(move || encode_jpeg_data_url(image, quality))
            .await
            .map_err(DescribeError::EncodeTask)??;

        let result = self
            .client
            .describe(&data_url, &self.config.prompt, self.config.max_tokens)
            .await?;

        info!(
            "VLM describe complete: {} chars, {} tokens, {}ms (model: {})",
            result.description.len(),
            result.tokens_used,
            result.processing_time_ms,
            result.model
        );

        Ok(result.description)
    }
}
