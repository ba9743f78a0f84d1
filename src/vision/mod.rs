// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - Upload decoding and JPEG re-encoding
//! - Image description via an OpenAI-compatible vision model

pub mod describer;
pub mod image_utils;
pub mod vlm_client;

pub use describer::{
    DescribeError, Describer, DescriberConfig, VisionDescriber, DEFAULT_DESCRIBE_MAX_TOKENS,
    DEFAULT_DESCRIBE_PROMPT,
};
pub use image_utils::{
    decode_image_bytes, detect_format, encode_jpeg_data_url, ImageError, ImageInfo,
    DEFAULT_MAX_IMAGE_SIZE,
};
pub use vlm_client::{VlmClient, VlmClientConfig, VlmDescribeResult};
