// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation provider trait definition

use async_trait::async_trait;
use thiserror::Error;

use super::payload::GenerationPayload;

/// Errors raised by a generation provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider did not finish within the configured deadline
    #[error("Provider request timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline in milliseconds
        timeout_ms: u64,
    },

    /// Non-success HTTP status from the provider API
    #[error("Provider API error: {status} - {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The provider accepted the request but the model run failed
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// The run succeeded but produced nothing usable as an image reference
    #[error("Provider returned no output")]
    EmptyOutput,

    /// Connection-level failure
    #[error("Provider request failed: {0}")]
    Transport(String),

    /// Response body could not be understood
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The staged image could not be read back for upload
    #[error("Failed to read staged image: {0}")]
    ImageRead(String),
}

/// Trait for hosted image-generation backends
///
/// Implementations turn a [`GenerationPayload`] into a reference (usually a URL)
/// to the generated image. Calls may take tens of seconds.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Run one generation and return the output reference
    async fn generate(&self, payload: &GenerationPayload) -> Result<String, ProviderError>;

    /// Provider name for logging and health reporting
    fn name(&self) -> &'static str;
}
