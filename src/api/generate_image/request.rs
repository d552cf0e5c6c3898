// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart form parsing and validation for POST /generate

use axum::http::StatusCode;
use axum_extra::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use tracing::debug;

use crate::api::errors::ApiError;
use crate::generation::{GenerationRequest, ImageUpload};

pub const PROMPT_FIELD: &str = "prompt";
pub const ASPECT_RATIO_FIELD: &str = "aspect_ratio";
pub const IMAGE_FIELD: &str = "image";

/// Raw form fields as received; nothing is required at this stage
#[derive(Debug, Clone, Default)]
pub struct GenerateImageForm {
    pub prompt: Option<String>,
    pub aspect_ratio: Option<String>,
    pub image: Option<ImageUpload>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidRequest(e.body_text())
    }
}

/// Interpret an `image` part; an empty part without a file name means "no file selected"
pub fn image_from_part(
    bytes: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
) -> Result<Option<ImageUpload>, ApiError> {
    let file_name = file_name.filter(|name| !name.is_empty());

    if bytes.is_empty() {
        return match file_name {
            None => Ok(None),
            Some(name) => Err(ApiError::ValidationError {
                field: IMAGE_FIELD.to_string(),
                message: format!("image upload '{}' is empty", name),
            }),
        };
    }

    Ok(Some(ImageUpload {
        bytes,
        content_type,
        file_name,
    }))
}

impl GenerateImageForm {
    /// Read every field of the multipart body
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        let mut image_seen = false;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                PROMPT_FIELD => form.prompt = Some(field.text().await.map_err(multipart_error)?),
                ASPECT_RATIO_FIELD => {
                    form.aspect_ratio = Some(field.text().await.map_err(multipart_error)?)
                }
                IMAGE_FIELD => {
                    if image_seen {
                        return Err(ApiError::ValidationError {
                            field: IMAGE_FIELD.to_string(),
                            message: "only one image upload is allowed".to_string(),
                        });
                    }
                    image_seen = true;
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.image = image_from_part(bytes, content_type, file_name)?;
                }
                other => debug!("Ignoring unknown form field '{}'", other),
            }
        }

        Ok(form)
    }

    /// Check required fields and produce a generation request
    pub fn validate(self) -> Result<GenerationRequest, ApiError> {
        let prompt = self
            .prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ApiError::missing_field(PROMPT_FIELD))?;
        let aspect_ratio = self
            .aspect_ratio
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ApiError::missing_field(ASPECT_RATIO_FIELD))?;

        Ok(GenerationRequest {
            prompt,
            aspect_ratio,
            image: self.image,
        })
    }
}
