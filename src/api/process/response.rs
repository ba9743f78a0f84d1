// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::speech::AudioClip;

/// Build the audio attachment returned by POST /process
pub fn audio_response(clip: AudioClip) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", clip.file_name);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(clip.mime_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(clip.bytes),
    )
        .into_response()
}
