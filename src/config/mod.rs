// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup configuration
//!
//! Every flag can also be supplied through its environment variable, and
//! `.env` is loaded before parsing, so a plain `.env` file is enough to run.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::generation::replicate::{ReplicateConfig, DEFAULT_API_BASE, DEFAULT_MODEL};

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Image generation relay
#[derive(Parser, Debug, Clone)]
#[command(name = "image-relay")]
#[command(version)]
#[command(about = "Relays prompt + optional image uploads to a hosted image-generation model", long_about = None)]
pub struct RelayConfig {
    /// Replicate API token
    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    pub replicate_api_token: String,

    /// Model to run, as owner/name or owner/name:version
    #[arg(long, env = "REPLICATE_MODEL", default_value = DEFAULT_MODEL)]
    pub replicate_model: String,

    /// Base URL of the Replicate HTTP API
    #[arg(long, env = "REPLICATE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub replicate_api_base: String,

    /// Comma-separated list of allowed CORS origins ("*" allows any)
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_CORS_ORIGIN
    )]
    pub cors_origins: Vec<String>,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Deadline for one provider call, polling included
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = 120)]
    pub provider_timeout_secs: u64,

    /// Delay between prediction status polls
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Maximum accepted request body size
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Directory for staging uploads (system temp dir if unset)
    #[arg(long, env = "STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,
}

impl RelayConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.replicate_api_token.trim().is_empty() {
            return Err("REPLICATE_API_TOKEN environment variable is not set".to_string());
        }
        if self.replicate_model.trim().is_empty() {
            return Err("Replicate model must not be empty".to_string());
        }
        if self.provider_timeout_secs == 0 {
            return Err("Provider timeout must be greater than 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("Poll interval must be greater than 0".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("Max upload size must be greater than 0".to_string());
        }
        if self.cors_origin_list().is_empty() {
            return Err("At least one CORS origin is required".to_string());
        }
        Ok(())
    }

    /// Allowed origins with surrounding whitespace and blank entries removed
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Provider settings, with the credential passed in explicitly
    pub fn replicate_config(&self) -> ReplicateConfig {
        ReplicateConfig::new(self.replicate_api_token.trim())
            .with_api_base(&self.replicate_api_base)
            .with_model(&self.replicate_model)
            .with_timeout(self.provider_timeout())
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}
