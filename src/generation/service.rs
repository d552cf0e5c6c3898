// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stage → build → invoke → release pipeline for one generation request

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::payload::GenerationPayload;
use super::provider::{ImageProvider, ProviderError};
use super::staging::{ImageUpload, StagedImage, StagingArea};

/// Validated input for one generation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: String,
    pub image: Option<ImageUpload>,
}

/// Failure after validation succeeded
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to stage uploaded image: {0}")]
    Staging(#[from] std::io::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Runs generations against one provider, staging uploads in one area
#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn ImageProvider>,
    staging: StagingArea,
}

impl GenerationService {
    pub fn new(provider: Arc<dyn ImageProvider>, staging: StagingArea) -> Self {
        Self { provider, staging }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Run one generation and return the provider's image reference
    ///
    /// Any staged file is released before this returns, on every path.
    pub async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let has_image = request.image.is_some();
        let result = self.run(&request).await;

        match &result {
            Ok(url) => info!(
                "Image generated via {}: aspect_ratio={}, has_image={}, url={}",
                self.provider.name(),
                request.aspect_ratio,
                has_image,
                url
            ),
            Err(e) => error!(
                "Error during image generation via {} (aspect_ratio={}, has_image={}, prompt_len={}): {:?}",
                self.provider.name(),
                request.aspect_ratio,
                has_image,
                request.prompt.len(),
                e
            ),
        }

        result
    }

    async fn run(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let staged = match &request.image {
            Some(upload) => Some(self.stage_blocking(upload.clone()).await?),
            None => None,
        };

        let payload = GenerationPayload::builder(&request.prompt, &request.aspect_ratio)
            .maybe_image_prompt(staged.as_ref().map(|s| s.reference()))
            .build();

        let result = self.provider.generate(&payload).await;

        if let Some(staged) = staged {
            debug!("Releasing staging file {}", staged.path().display());
            staged.release();
        }

        Ok(result?)
    }

    /// Write the upload on the blocking pool; uploads can be tens of MiB
    async fn stage_blocking(&self, upload: ImageUpload) -> std::io::Result<StagedImage> {
        let staging = self.staging.clone();
        tokio::task::spawn_blocking(move || staging.stage(&upload))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
    }
}
