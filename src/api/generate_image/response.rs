// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation response types

use serde::{Deserialize, Serialize};

/// Successful response from POST /generate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateImageResponse {
    /// Provider-supplied reference to the generated image
    pub generated_image_url: String,
}

impl GenerateImageResponse {
    pub fn new(generated_image_url: impl Into<String>) -> Self {
        Self {
            generated_image_url: generated_image_url.into(),
        }
    }
}
