// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process endpoint module
//!
//! Provides POST /process: upload a photo, receive a spoken description.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::process_handler;
pub use request::{read_image_field, IMAGE_FIELD};
pub use response::audio_response;
