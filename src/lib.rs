// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod speech;
pub mod version;
pub mod vision;

pub use api::{create_app, start_server, AppState, HttpOptions};
pub use pipeline::{DescriptionPipeline, Narration, PipelineError};
