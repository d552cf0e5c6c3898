// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Replicate predictions API client

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::payload::GenerationPayload;
use super::provider::{ImageProvider, ProviderError};

pub const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
pub const DEFAULT_MODEL: &str = "black-forest-labs/flux-1.1-pro";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Connection settings for [`ReplicateClient`]
#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: String,
    pub api_base: String,
    /// `owner/name` for official models, `owner/name:version` for pinned versions
    pub model: String,
    /// Deadline for one whole prediction, polling included
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ReplicateConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Parsed model identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    /// `owner/name`: runs the model's latest version
    Official { owner: String, name: String },
    /// `owner/name:version`: runs a pinned version
    Version { version: String },
}

impl ModelRef {
    pub fn parse(model: &str) -> std::result::Result<Self, String> {
        let (slug, version) = match model.split_once(':') {
            Some((slug, version)) => (slug, Some(version)),
            None => (model, None),
        };

        let (owner, name) = slug
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| format!("invalid model '{}'; expected owner/name[:version]", model))?;

        match version {
            Some(v) if v.is_empty() => Err(format!("empty version in model '{}'", model)),
            Some(v) => Ok(Self::Version {
                version: v.to_string(),
            }),
            None => Ok(Self::Official {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

// --- Replicate response types ---

#[derive(Debug, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

impl Prediction {
    fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => format!("prediction {}", self.status),
            Some(other) => other.to_string(),
        }
    }
}

/// Client for running models on Replicate
pub struct ReplicateClient {
    client: Client,
    config: ReplicateConfig,
    model_ref: ModelRef,
}

impl ReplicateClient {
    /// Create a new ReplicateClient
    pub fn new(mut config: ReplicateConfig) -> Result<Self> {
        let model_ref = ModelRef::parse(&config.model).map_err(|e| anyhow::anyhow!(e))?;
        let client = Client::builder().timeout(config.timeout).build()?;

        config.api_base = config.api_base.trim_end_matches('/').to_string();
        info!(
            "Replicate client configured: api_base={}, model={}, timeout={:?}",
            config.api_base, config.model, config.timeout
        );

        Ok(Self {
            client,
            config,
            model_ref,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                timeout_ms: self.timeout_ms(),
            }
        } else {
            ProviderError::Transport(e.to_string())
        }
    }

    async fn read_prediction(response: reqwest::Response) -> Result<Prediction, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: text,
            });
        }

        response
            .json::<Prediction>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn create_prediction(&self, input: Value) -> Result<Prediction, ProviderError> {
        let (url, body) = match &self.model_ref {
            ModelRef::Official { owner, name } => (
                format!("{}/models/{}/{}/predictions", self.config.api_base, owner, name),
                json!({ "input": input }),
            ),
            ModelRef::Version { version } => (
                format!("{}/predictions", self.config.api_base),
                json!({ "version": version, "input": input }),
            ),
        };
        debug!("Replicate create prediction POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_prediction(response).await
    }

    async fn poll_prediction(&self, poll_url: &str) -> Result<Prediction, ProviderError> {
        debug!("Replicate poll GET {}", poll_url);

        let response = self
            .client
            .get(poll_url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_prediction(response).await
    }

    async fn run_prediction(&self, payload: &GenerationPayload) -> Result<String, ProviderError> {
        let input = build_input(payload).await?;
        let mut prediction = self.create_prediction(input).await?;

        loop {
            match prediction.status.as_str() {
                "succeeded" => return output_reference(prediction.output.as_ref()),
                "failed" | "canceled" | "aborted" => {
                    return Err(ProviderError::PredictionFailed(prediction.error_message()))
                }
                "starting" | "processing" => {
                    let poll_url = prediction
                        .urls
                        .as_ref()
                        .and_then(|urls| urls.get.clone())
                        .filter(|url| !url.trim().is_empty())
                        .ok_or_else(|| {
                            ProviderError::InvalidResponse(
                                "prediction missing poll URL".to_string(),
                            )
                        })?;
                    debug!(
                        "Prediction {} still {}, polling",
                        prediction.id.as_deref().unwrap_or("?"),
                        prediction.status
                    );
                    tokio::time::sleep(self.config.poll_interval).await;
                    prediction = self.poll_prediction(&poll_url).await?;
                }
                other => {
                    return Err(ProviderError::InvalidResponse(format!(
                        "unknown prediction status '{}'",
                        other
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl ImageProvider for ReplicateClient {
    async fn generate(&self, payload: &GenerationPayload) -> Result<String, ProviderError> {
        let start = Instant::now();

        let output = tokio::time::timeout(self.config.timeout, self.run_prediction(payload))
            .await
            .map_err(|_| ProviderError::Timeout {
                timeout_ms: self.timeout_ms(),
            })??;

        info!(
            "Replicate prediction succeeded: model={}, {}ms",
            self.config.model,
            start.elapsed().as_millis()
        );
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "replicate"
    }
}

/// Build the model `input` object for a payload
pub async fn build_input(payload: &GenerationPayload) -> Result<Value, ProviderError> {
    let mut input = json!({
        "prompt": payload.prompt(),
        "aspect_ratio": payload.aspect_ratio(),
        "output_format": payload.output_format(),
        "output_quality": payload.output_quality(),
        "safety_tolerance": payload.safety_tolerance(),
        "prompt_upsampling": payload.prompt_upsampling(),
    });
    if let Some(image) = payload.image_prompt() {
        let uri = image
            .to_data_uri()
            .await
            .map_err(|e| ProviderError::ImageRead(e.to_string()))?;
        input["image_prompt"] = json!(uri);
    }
    Ok(input)
}

/// Convert a prediction's `output` into a single image reference
pub fn output_reference(output: Option<&Value>) -> Result<String, ProviderError> {
    match output {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Array(items)) => output_reference(items.first()),
        Some(Value::Object(obj)) => output_reference(obj.get("url")),
        _ => Err(ProviderError::EmptyOutput),
    }
}
