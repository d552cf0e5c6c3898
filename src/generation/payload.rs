// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Provider input payload and its builder

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

/// Output format requested from the model
pub const DEFAULT_OUTPUT_FORMAT: &str = "png";

/// Output quality (0-100) requested from the model
pub const DEFAULT_OUTPUT_QUALITY: u8 = 80;

/// Provider safety tolerance (1 = strictest)
pub const DEFAULT_SAFETY_TOLERANCE: u8 = 2;

/// Whether the provider may rewrite the prompt before inference
pub const DEFAULT_PROMPT_UPSAMPLING: bool = true;

/// Reference to an uploaded image staged on local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    path: PathBuf,
    content_type: String,
}

impl ImageReference {
    pub fn new(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Read the staged file and encode it as a `data:` URI
    pub async fn to_data_uri(&self) -> std::io::Result<String> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(bytes)
        ))
    }
}

/// Immutable set of named fields sent to the generation provider
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPayload {
    prompt: String,
    aspect_ratio: String,
    output_format: String,
    output_quality: u8,
    safety_tolerance: u8,
    prompt_upsampling: bool,
    image_prompt: Option<ImageReference>,
}

impl GenerationPayload {
    /// Start a payload from the required fields; everything else gets the fixed defaults
    pub fn builder(
        prompt: impl Into<String>,
        aspect_ratio: impl Into<String>,
    ) -> GenerationPayloadBuilder {
        GenerationPayloadBuilder {
            prompt: prompt.into(),
            aspect_ratio: aspect_ratio.into(),
            image_prompt: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    pub fn output_quality(&self) -> u8 {
        self.output_quality
    }

    pub fn safety_tolerance(&self) -> u8 {
        self.safety_tolerance
    }

    pub fn prompt_upsampling(&self) -> bool {
        self.prompt_upsampling
    }

    pub fn image_prompt(&self) -> Option<&ImageReference> {
        self.image_prompt.as_ref()
    }
}

/// Builder for [`GenerationPayload`]
#[derive(Debug, Clone)]
pub struct GenerationPayloadBuilder {
    prompt: String,
    aspect_ratio: String,
    image_prompt: Option<ImageReference>,
}

impl GenerationPayloadBuilder {
    /// Attach the staged image (image-guided generation)
    pub fn image_prompt(mut self, image: ImageReference) -> Self {
        self.image_prompt = Some(image);
        self
    }

    /// Attach the staged image if there is one
    pub fn maybe_image_prompt(mut self, image: Option<ImageReference>) -> Self {
        self.image_prompt = image;
        self
    }

    pub fn build(self) -> GenerationPayload {
        GenerationPayload {
            prompt: self.prompt,
            aspect_ratio: self.aspect_ratio,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            output_quality: DEFAULT_OUTPUT_QUALITY,
            safety_tolerance: DEFAULT_SAFETY_TOLERANCE,
            prompt_upsampling: DEFAULT_PROMPT_UPSAMPLING,
            image_prompt: self.image_prompt,
        }
    }
}
