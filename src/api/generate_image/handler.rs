// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, error, warn};

use super::request::GenerateImageForm;
use super::response::GenerateImageResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// POST /generate - Generate an image from a prompt and optional image upload
///
/// Pipeline:
/// 1. Parse multipart form (400 on malformed body)
/// 2. Validate prompt and aspect_ratio (400 if missing)
/// 3. Hand off to GenerationService in its own task, so a client
///    disconnect does not cancel the provider call or skip cleanup
/// 4. Map the result to 200 / 500 JSON
pub async fn generate_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        warn!("Rejected non-multipart generate request: {}", e.body_text());
        ApiError::InvalidRequest(e.body_text())
    })?;

    let request = GenerateImageForm::from_multipart(multipart)
        .await
        .and_then(GenerateImageForm::validate)
        .map_err(|e| {
            warn!("Image generation validation failed: {}", e);
            e
        })?;

    debug!(
        "Image generation request received: prompt_len={}, aspect_ratio={}, image_bytes={:?}",
        request.prompt.len(),
        request.aspect_ratio,
        request.image.as_ref().map(|image| image.bytes.len())
    );

    let service = state.generation.clone();
    let url = tokio::spawn(async move { service.generate(request).await })
        .await
        .map_err(|e| {
            error!("Image generation task failed: {}", e);
            ApiError::InternalError("generation task failed".to_string())
        })??;

    Ok(Json(GenerateImageResponse::new(url)))
}
