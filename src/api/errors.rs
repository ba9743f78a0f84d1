// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineError;
use crate::vision::ImageError;

pub const MISSING_IMAGE_MESSAGE: &str = "No image file provided";
pub const INVALID_IMAGE_MESSAGE: &str = "Invalid image file";
pub const TOO_LARGE_MESSAGE: &str = "Image file is too large";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures surfaced by the HTTP layer
///
/// Client errors carry a specific message. Server errors keep their detail
/// for the logs only; the response body is always the generic message.
#[derive(Debug, Clone)]
pub enum ApiError {
    MissingInput,
    InvalidImage(String),
    PayloadTooLarge(String),
    DescriptionFailed(String),
    NarrationFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ApiError::MissingInput => MISSING_IMAGE_MESSAGE,
            ApiError::InvalidImage(_) => INVALID_IMAGE_MESSAGE,
            ApiError::PayloadTooLarge(_) => TOO_LARGE_MESSAGE,
            ApiError::DescriptionFailed(_)
            | ApiError::NarrationFailed(_)
            | ApiError::InternalError(_) => INTERNAL_ERROR_MESSAGE,
        };

        ErrorResponse {
            error: message.to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingInput | ApiError::InvalidImage(_) => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::DescriptionFailed(_)
            | ApiError::NarrationFailed(_)
            | ApiError::InternalError(_) => 500,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingInput => write!(f, "Missing input: no image field in request"),
            ApiError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::DescriptionFailed(msg) => write!(f, "Description failed: {}", msg),
            ApiError::NarrationFailed(msg) => write!(f, "Narration failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        // Keep the whole source chain for the logs
        let detail = error_chain(&err);
        match err {
            PipelineError::InvalidImage(
                ImageError::TooLarge(..)
                | ImageError::DimensionsTooLarge { .. }
                | ImageError::LimitsExceeded(_),
            ) => ApiError::PayloadTooLarge(detail),
            PipelineError::InvalidImage(_) => ApiError::InvalidImage(detail),
            PipelineError::DescriptionFailed(_) => ApiError::DescriptionFailed(detail),
            PipelineError::NarrationFailed(_) => ApiError::NarrationFailed(detail),
            PipelineError::DecodeTask(_) => ApiError::InternalError(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !detail.contains(&cause_text) {
            detail.push_str(": ");
            detail.push_str(&cause_text);
        }
        source = cause.source();
    }
    detail
}
