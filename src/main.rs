// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use image_relay::{
    api::{start_server, AppState},
    config::RelayConfig,
    generation::{GenerationService, ReplicateClient, StagingArea},
    version,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenv_result {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(_) => warn!("No .env file found, using process environment"),
    }

    info!("Starting image relay {} (built {})", version::VERSION, version::BUILD_DATE);

    let config = RelayConfig::parse();
    config.validate().map_err(|e| anyhow!(e))?;

    let addr = config
        .listen_addr()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let client = ReplicateClient::new(config.replicate_config())
        .context("failed to create Replicate client")?;

    let staging = StagingArea::new(config.staging_dir.clone());
    if let Some(dir) = staging.dir() {
        info!("Staging uploads in {}", dir.display());
    }

    let origins = config.cors_origin_list();
    info!("CORS origins: {}", origins.join(", "));

    let state = AppState::new(GenerationService::new(Arc::new(client), staging))
        .with_cors_origins(origins)
        .with_max_upload_bytes(config.max_upload_bytes);

    start_server(state, addr).await
}
