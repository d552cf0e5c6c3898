// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod generation;
pub mod version;

pub use api::{create_app, AppState};
pub use config::RelayConfig;
pub use generation::{
    GenerationPayload, GenerationService, ImageProvider, ProviderError, ReplicateClient,
    ReplicateConfig, StagingArea,
};
