// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation via a hosted provider with scoped staging of uploads

pub mod payload;
pub mod provider;
pub mod replicate;
pub mod service;
pub mod staging;

pub use payload::{GenerationPayload, GenerationPayloadBuilder, ImageReference};
pub use provider::{ImageProvider, ProviderError};
pub use replicate::{ReplicateClient, ReplicateConfig};
pub use service::{GenerationError, GenerationRequest, GenerationService};
pub use staging::{ImageUpload, StagedImage, StagingArea};
