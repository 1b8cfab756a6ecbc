// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an OpenAI-compatible API.
//!
//! [`OpenAiClient`] handles authentication, the per-call timeout and the
//! mapping of upstream failures onto the Lumen error taxonomy. It never
//! retries: retry is a user decision made in the lifecycle controller.

use std::time::Duration;

use lumen_core::LumenError;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ImageGenerationRequest,
    ImageGenerationResponse,
};

/// Authenticated client for one provider base URL.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Creates a client sending `Authorization: Bearer <api_key>`.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, LumenError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| LumenError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LumenError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /images/generations`.
    pub async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LumenError> {
        self.post_json("images/generations", request, "image generation failed")
            .await
    }

    /// `POST /chat/completions`.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LumenError> {
        self.post_json("chat/completions", request, "prompt optimization failed")
            .await
    }

    async fn post_json<B, R>(
        &self,
        endpoint: &str,
        body: &B,
        failure_message: &str,
    ) -> Result<R, LumenError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, endpoint, "upstream response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body, failure_message));
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, endpoint, "unparseable upstream response");
            LumenError::api(
                "unexpected response from the image service",
                502,
                Some(format!("failed to parse response: {e}")),
            )
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> LumenError {
        if err.is_timeout() {
            warn!(timeout_secs = self.timeout.as_secs(), "upstream call timed out");
            return LumenError::Timeout {
                duration: self.timeout,
            };
        }
        warn!(error = %err, "upstream call failed");
        LumenError::Network {
            message: "could not reach the image service".to_string(),
            details: Some(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Maps a non-2xx upstream status onto the error taxonomy.
///
/// 401 becomes AUTH, 429 becomes a rate-limit API error, everything else an
/// API error carrying the upstream status and the provider's message.
pub fn map_status_error(status: StatusCode, body: &str, failure_message: &str) -> LumenError {
    let provider_message = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty());
    let details = provider_message.unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED => {
            LumenError::auth("the image service rejected the API key", Some(details))
        }
        StatusCode::TOO_MANY_REQUESTS => LumenError::api(
            "too many requests, please slow down",
            429,
            Some(details),
        ),
        other => LumenError::api(failure_message, other.as_u16(), Some(details)),
    }
}
