// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the SightSync node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-spoken-descriptions-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "multipart-upload",
    "bounded-image-decoding",
    "vision-description",
    "gtts-narration",
    "openai-speech-narration",
    "upstream-timeouts",
    "cors",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("SightSync Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
