// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload parsing for the process endpoint

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::api::errors::ApiError;

/// Form field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Read the bytes of the `image` field, skipping any other fields
///
/// A body that ends without the field, or that cannot be parsed as
/// multipart, counts as missing input. Bodies over the size limit are
/// reported as too large.
pub async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::MissingInput),
            Err(e) => return Err(multipart_error(e.status(), e.body_text())),
        };

        if field.name() != Some(IMAGE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e.status(), e.body_text()))?;

        debug!(
            "Received image field: file_name={:?}, {} bytes",
            file_name,
            bytes.len()
        );
        return Ok(bytes);
    }
}

fn multipart_error(status: StatusCode, detail: String) -> ApiError {
    warn!("Failed to read multipart body ({}): {}", status, detail);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(detail)
    } else {
        ApiError::MissingInput
    }
}
