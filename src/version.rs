// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the image relay

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-replicate-relay-2026-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "text-to-image",
    "image-prompt-upload",
    "replicate-predictions",
    "prediction-polling",
    "scoped-staging-files",
    "configurable-cors",
];

/// Check whether a named feature is compiled into this build
pub fn has_feature(name: &str) -> bool {
    FEATURES.contains(&name)
}
