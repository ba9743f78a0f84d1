// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, response::Response};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use tracing::{error, info, warn};

use super::{read_image_field, response::audio_response};
use crate::api::{errors::ApiError, http_server::AppState};

/// POST /process - Describe an uploaded photo and return the description as MP3
///
/// Expects `multipart/form-data` with the picture in the `image` field.
pub async fn process_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let result = async {
        let mut multipart = multipart.map_err(|rejection| {
            warn!("Rejected non-multipart upload: {}", rejection);
            ApiError::MissingInput
        })?;

        let image_bytes = read_image_field(&mut multipart).await?;
        let upload_len = image_bytes.len();
        let narration = state.pipeline.run(image_bytes).await?;

        info!(
            "Processed image: {} bytes in, {} bytes of audio out via {} in {}ms",
            upload_len,
            narration.audio.len(),
            state.pipeline.narrator_backend(),
            narration.processing_time_ms
        );
        Ok::<_, ApiError>(audio_response(narration.audio))
    }
    .await;

    if let Err(ref err) = result {
        if err.is_server_error() {
            error!("Process request failed: {}", err);
        } else {
            warn!("Process request rejected: {}", err);
        }
    }
    result
}
