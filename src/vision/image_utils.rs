// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and re-encoding for the vision call

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, GenericImageView, ImageFormat, ImageReader, Limits};
use std::io::Cursor;
use thiserror::Error;

/// Default upper bound for an uploaded image (10MB)
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Widest or tallest image accepted for decoding
pub const MAX_DECODED_DIMENSION: u32 = 8192;

/// Largest buffer the decoder may allocate (256MB)
pub const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// Longest side of the image sent to the vision model
pub const MAX_VISION_DIMENSION: u32 = 2048;

/// Default JPEG quality used when re-encoding for transmission
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image as JPEG: {0}")]
    EncodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Image dimensions {width}x{height} exceed the {max}px limit")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    #[error("Image needs more memory than allowed to decode: {0}")]
    LimitsExceeded(String),
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes from a multipart upload
///
/// # Arguments
/// * `bytes` - Raw image bytes
/// * `max_size` - Largest accepted payload in bytes
///
/// # Returns
/// * `Ok((DynamicImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ImageError)` - If the bytes are empty, oversized or not an image
///
/// The header is read first so that oversized dimensions are rejected before
/// any pixel buffer is allocated. The decode itself runs under [`Limits`].
pub fn decode_image_bytes(
    bytes: &[u8],
    max_size: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > max_size {
        return Err(ImageError::TooLarge(bytes.len(), max_size));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    // Detect format from magic bytes
    let format = detect_format(bytes)?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(decode_error)?;
    if width > MAX_DECODED_DIMENSION || height > MAX_DECODED_DIMENSION {
        return Err(ImageError::DimensionsTooLarge {
            width,
            height,
            max: MAX_DECODED_DIMENSION,
        });
    }

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(decode_limits());
    let img = reader.decode().map_err(decode_error)?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
///
/// # Arguments
/// * `bytes` - Raw image data
///
/// # Returns
/// * `Ok(ImageFormat)` - Detected format
/// * `Err(ImageError::UnsupportedFormat)` - If format cannot be detected
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODED_DIMENSION);
    limits.max_image_height = Some(MAX_DECODED_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

fn decode_error(err: image::ImageError) -> ImageError {
    match err {
        image::ImageError::Limits(e) => ImageError::LimitsExceeded(e.to_string()),
        e => ImageError::DecodeFailed(e.to_string()),
    }
}

/// Scale the image down so its longest side is at most `max_side`
///
/// Aspect ratio is preserved. Images already within bounds are returned as is.
pub fn fit_within(image: DynamicImage, max_side: u32) -> DynamicImage {
    let (orig_w, orig_h) = image.dimensions();
    if orig_w <= max_side && orig_h <= max_side {
        return image;
    }

    let scale = (max_side as f32 / orig_w as f32).min(max_side as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, max_side);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, max_side);

    // Box averaging needs no intermediate float buffer
    image.thumbnail_exact(new_w, new_h)
}

/// Shrink, re-encode as JPEG and wrap in a `data:` URI
///
/// The longest side is capped at [`MAX_VISION_DIMENSION`]. JPEG has no alpha
/// channel, so the image is flattened to RGB after scaling.
pub fn encode_jpeg_data_url(image: DynamicImage, quality: u8) -> Result<String, ImageError> {
    let rgb = fit_within(image, MAX_VISION_DIMENSION).to_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)))
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg)))
}
