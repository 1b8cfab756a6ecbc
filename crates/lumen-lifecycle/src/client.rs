// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Lumen gateway.
//!
//! [`GatewayClient`] implements [`ImageProvider`] by calling the gateway's
//! JSON and multipart routes, and turns rendered error bodies back into
//! [`LumenError`] values of the same kind.

use std::time::Duration;

use async_trait::async_trait;
use lumen_config::LumenConfig;
use lumen_core::types::{ErrorBody, GenerateRequest, GenerateResponse, OptimizeRequest, OptimizeResponse};
use lumen_core::{
    AdapterType, GenerationParams, HealthStatus, ImageProvider, ImageRecord, LumenError,
    PluginAdapter,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Client for one gateway base URL.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LumenError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LumenError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Uses `[client].gateway_url`, allowing the gateway its own upstream
    /// timeout plus a margin.
    pub fn from_config(config: &LumenConfig) -> Result<Self, LumenError> {
        let timeout = Duration::from_secs(config.provider.timeout_secs.saturating_add(10));
        Self::new(&config.client.gateway_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health` as raw JSON.
    pub async fn health(&self) -> Result<serde_json::Value, LumenError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response).await
    }

    async fn decode<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R, LumenError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => LumenError::from_parts(&body.code, status.as_u16(), body.error, body.details),
                Err(_) => LumenError::api(
                    format!("gateway returned HTTP {}", status.as_u16()),
                    status.as_u16(),
                    (!text.is_empty()).then_some(text),
                ),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "unparseable gateway response");
            LumenError::api(
                "unexpected response from the gateway",
                502,
                Some(e.to_string()),
            )
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> LumenError {
        if err.is_timeout() {
            return LumenError::Timeout {
                duration: self.timeout,
            };
        }
        LumenError::Network {
            message: "could not reach the Lumen gateway".to_string(),
            details: Some(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[async_trait]
impl PluginAdapter for GatewayClient {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LumenError> {
        match self.health().await {
            Ok(body) => match body.get("status").and_then(|s| s.as_str()) {
                Some("healthy") => Ok(HealthStatus::Healthy),
                Some(other) => Ok(HealthStatus::Degraded(format!("gateway reports {other}"))),
                None => Ok(HealthStatus::Degraded("gateway health body has no status".into())),
            },
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), LumenError> {
        Ok(())
    }
}

#[async_trait]
impl ImageProvider for GatewayClient {
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<ImageRecord>, LumenError> {
        let request = match params {
            GenerationParams::TextToImage {
                prompt,
                size,
                count,
                style,
            } => self
                .client
                .post(format!("{}/api/generate", self.base_url))
                .json(&GenerateRequest {
                    prompt: prompt.clone(),
                    size: size.to_string(),
                    count: i64::from(*count),
                    style: style.clone(),
                }),
            GenerationParams::ImageToImage {
                prompt,
                size,
                count,
                style,
                strength,
                image,
            } => {
                let part = Part::bytes(image.bytes.clone())
                    .file_name(image.file_name.clone().unwrap_or_else(|| "image".to_string()))
                    .mime_str(&image.mime)
                    .map_err(|e| LumenError::file("invalid image content type", Some(e.to_string())))?;
                let form = Form::new()
                    .part("image", part)
                    .text("prompt", prompt.clone())
                    .text("strength", strength.to_string())
                    .text("size", size.to_string())
                    .text("count", count.to_string())
                    .text("style", style.clone());
                self.client
                    .post(format!("{}/api/image-to-image", self.base_url))
                    .multipart(form)
            }
        };

        debug!(mode = %params.source(), "sending generation request to gateway");
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let body: GenerateResponse = self.decode(response).await?;
        Ok(body.images)
    }

    async fn optimize_prompt(&self, prompt: &str, style: &str) -> Result<String, LumenError> {
        let response = self
            .client
            .post(format!("{}/api/optimize-prompt", self.base_url))
            .json(&OptimizeRequest {
                prompt: prompt.to_string(),
                style: style.to_string(),
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: OptimizeResponse = self.decode(response).await?;
        Ok(body.optimized_prompt)
    }
}
