// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider proxy for OpenAI-compatible image APIs.
//!
//! [`OpenAiImageProvider`] implements [`ImageProvider`] for both generation
//! modes and for prompt optimization. Reference images are not sent upstream:
//! image-to-image is expressed through the prompt text.

pub mod client;
pub mod records;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use lumen_config::LumenConfig;
use lumen_config::model::{ProviderConfig, RuntimeConfig};
use lumen_core::traits::{ImageProvider, PluginAdapter};
use lumen_core::types::{AdapterType, GenerationParams, HealthStatus, ImageRecord};
use lumen_core::{LumenError, augment_prompt};
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;
use crate::types::{ChatCompletionRequest, ChatMessage, ImageGenerationRequest};

/// Env var consulted when `provider.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Env var consulted when `provider.base_url` is left at its default.
pub const BASE_URL_ENV: &str = "OPENAI_API_BASE_URL";

/// Image provider backed by an OpenAI-compatible API.
///
/// A missing API key does not prevent construction; every call then fails
/// with an AUTH error before touching the network.
pub struct OpenAiImageProvider {
    client: Option<OpenAiClient>,
    provider: ProviderConfig,
    runtime: RuntimeConfig,
}

impl OpenAiImageProvider {
    /// Builds the provider, resolving the API key and base URL from config
    /// and then from the environment.
    pub fn new(config: &LumenConfig) -> Result<Self, LumenError> {
        let api_key = resolve_api_key(&config.provider.api_key);
        let mut provider = config.provider.clone();
        provider.base_url = resolve_base_url(&provider.base_url);
        Self::with_api_key(provider, config.runtime.clone(), api_key)
    }

    /// Builds the provider with an explicit key (or none).
    pub fn with_api_key(
        provider: ProviderConfig,
        runtime: RuntimeConfig,
        api_key: Option<String>,
    ) -> Result<Self, LumenError> {
        let client = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => Some(OpenAiClient::new(
                &key,
                &provider.base_url,
                Duration::from_secs(provider.timeout_secs),
            )?),
            None => {
                warn!("no provider API key configured; generation requests will fail with AUTH_ERROR");
                None
            }
        };

        info!(
            base_url = %provider.base_url,
            image_model = %provider.image_model,
            fallback = runtime.fallback_enabled(),
            "image provider initialized"
        );

        Ok(Self {
            client,
            provider,
            runtime,
        })
    }

    fn client(&self) -> Result<&OpenAiClient, LumenError> {
        self.client.as_ref().ok_or_else(|| {
            LumenError::auth(
                "API key is not configured",
                Some(format!("set provider.api_key or {API_KEY_ENV}")),
            )
        })
    }

    /// Prompt actually sent upstream for `params`.
    pub fn upstream_prompt(params: &GenerationParams) -> String {
        let augmented = augment_prompt(params.prompt(), params.style());
        match params {
            GenerationParams::TextToImage { .. } => augmented,
            GenerationParams::ImageToImage { strength, .. } => format!(
                "Based on the uploaded image, create a new image with these modifications: {augmented}. Strength of modification: {}%",
                (strength * 100.0).round() as i64
            ),
        }
    }

    async fn call_upstream(
        &self,
        client: &OpenAiClient,
        params: &GenerationParams,
    ) -> Result<Vec<ImageRecord>, LumenError> {
        let request = ImageGenerationRequest {
            model: self.provider.image_model.clone(),
            prompt: Self::upstream_prompt(params),
            n: params.count(),
            size: params.size().to_string(),
            quality: self.provider.quality.clone(),
            response_format: "url".to_string(),
        };
        debug!(source = %params.source(), n = request.n, size = %request.size, "calling image endpoint");

        let response = client.generate_images(&request).await?;
        Ok(records::normalize(params, &response.data))
    }
}

#[async_trait]
impl PluginAdapter for OpenAiImageProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LumenError> {
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("API key not configured".into()),
        })
    }

    async fn shutdown(&self) -> Result<(), LumenError> {
        debug!("image provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<ImageRecord>, LumenError> {
        let client = self.client()?;
        let result = self.call_upstream(client, params).await;

        if self.runtime.fallback_enabled() {
            let reason = match &result {
                Ok(records) if records.is_empty() => Some("empty result".to_string()),
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            };
            if let Some(reason) = reason {
                warn!(reason = %reason, count = params.count(), "substituting placeholder images");
                return Ok(records::placeholders(
                    params,
                    &self.runtime.placeholder_base_url,
                ));
            }
        }

        let records = result?;
        if records.is_empty() {
            return Err(LumenError::api(
                "no valid images returned",
                502,
                Some("the provider returned no image data".into()),
            ));
        }
        info!(source = %params.source(), count = records.len(), "images generated");
        Ok(records)
    }

    async fn optimize_prompt(&self, prompt: &str, style: &str) -> Result<String, LumenError> {
        let client = self.client()?;
        let request = ChatCompletionRequest {
            model: self.provider.text_model.clone(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: optimization_instruction(prompt, style),
            }],
            max_tokens: self.provider.optimize_max_tokens,
        };

        let response = client.chat_completion(&request).await?;
        let optimized = response.first_text().unwrap_or_default().trim().to_string();
        if optimized.is_empty() || optimized == prompt.trim() {
            return Err(LumenError::api(
                "prompt optimization failed",
                502,
                Some("the model returned no improved prompt".into()),
            ));
        }
        debug!(chars = optimized.chars().count(), "prompt optimized");
        Ok(optimized)
    }
}

fn optimization_instruction(prompt: &str, style: &str) -> String {
    format!(
        "Rewrite the following AI image-generation prompt so it is more specific, detailed and professional while keeping its original intent.\n\n\
         Original prompt: \"{prompt}\"\n\
         Desired style: {style}\n\n\
         The rewritten prompt should:\n\
         1. keep the original creative intent\n\
         2. add technical detail such as lighting, composition and texture\n\
         3. use professional art terminology\n\
         4. suit the {style} style\n\n\
         Reply with the rewritten prompt only, without any explanation:"
    )
}

/// API key from config, falling back to [`API_KEY_ENV`].
pub fn resolve_api_key(config_key: &Option<String>) -> Option<String> {
    if let Some(key) = config_key.as_ref().filter(|k| !k.trim().is_empty()) {
        return Some(key.clone());
    }
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

/// Base URL from config; the env var only replaces the compiled default.
pub fn resolve_base_url(config_url: &str) -> String {
    if config_url == lumen_config::model::DEFAULT_BASE_URL {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                return url;
            }
        }
    }
    config_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_config::RuntimeMode;
    use lumen_core::{ErrorKind, ImageSize, ImageSource, ReferenceImage};
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..ProviderConfig::default()
        }
    }

    fn provider(base_url: &str) -> OpenAiImageProvider {
        OpenAiImageProvider::with_api_key(
            provider_config(base_url),
            RuntimeConfig::default(),
            Some("sk-test".into()),
        )
        .unwrap()
    }

    fn dev_fallback() -> RuntimeConfig {
        RuntimeConfig {
            mode: RuntimeMode::Development,
            placeholder_fallback: true,
            ..RuntimeConfig::default()
        }
    }

    fn text_params(count: u8) -> GenerationParams {
        GenerationParams::TextToImage {
            prompt: "a cat".into(),
            size: ImageSize::Square1024,
            count,
            style: "anime".into(),
        }
    }

    fn img2img_params(strength: f64) -> GenerationParams {
        GenerationParams::ImageToImage {
            prompt: "make it night".into(),
            size: ImageSize::Square512,
            count: 1,
            style: "unknown-style".into(),
            strength,
            image: ReferenceImage {
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
                mime: "image/png".into(),
                file_name: Some("day.png".into()),
            },
        }
    }

    fn urls(n: usize) -> serde_json::Value {
        let data: Vec<_> = (0..n)
            .map(|i| serde_json::json!({"url": format!("https://img.example/{i}.png")}))
            .collect();
        serde_json::json!({"created": 1, "data": data})
    }

    #[tokio::test]
    async fn style_modifier_is_sent_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(body_partial_json(serde_json::json!({
                "prompt": "a cat, 动漫风格, 日式插画, 精美绘画",
                "n": 2,
                "size": "1024x1024",
                "quality": "standard",
                "response_format": "url"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(urls(2)))
            .expect(1)
            .mount(&server)
            .await;

        let records = provider(&server.uri()).generate(&text_params(2)).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.prompt == "a cat" && r.style == "anime"));
        assert!(records.iter().all(|r| r.source == ImageSource::TextToImage));
    }

    #[test]
    fn image_to_image_prompt_embeds_strength() {
        let prompt = OpenAiImageProvider::upstream_prompt(&img2img_params(0.756));
        assert_eq!(
            prompt,
            "Based on the uploaded image, create a new image with these modifications: make it night. Strength of modification: 76%"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(urls(1)))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OpenAiImageProvider::with_api_key(
            provider_config(&server.uri()),
            dev_fallback(),
            None,
        )
        .unwrap();
        let err = provider.generate(&text_params(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.status_code(), 401);

        let err = provider.optimize_prompt("a cat", "anime").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(matches!(
            provider.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn zero_images_is_api_502() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(urls(0)))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .generate(&text_params(1))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.user_message(), "no valid images returned");
    }

    #[tokio::test]
    async fn production_never_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        // fallback flag set but mode is production: the flag is ignored.
        let runtime = RuntimeConfig {
            placeholder_fallback: true,
            ..RuntimeConfig::default()
        };
        let provider = OpenAiImageProvider::with_api_key(
            provider_config(&server.uri()),
            runtime,
            Some("sk".into()),
        )
        .unwrap();
        let err = provider.generate(&text_params(2)).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[tokio::test]
    async fn development_fallback_substitutes_placeholders() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiImageProvider::with_api_key(
            provider_config(&server.uri()),
            dev_fallback(),
            Some("sk".into()),
        )
        .unwrap();
        let records = provider.generate(&img2img_params(0.5)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].id.starts_with("demo_img2img_"));
        assert!(records[0].url.starts_with("https://picsum.photos/512/512?random="));
        assert_eq!(records[0].strength, Some(0.5));
    }

    #[tokio::test]
    async fn optimize_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini", "max_tokens": 200})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  a fluffy cat, soft rim light  \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let optimized = provider(&server.uri())
            .optimize_prompt("a cat", "anime")
            .await
            .unwrap();
        assert_eq!(optimized, "a fluffy cat, soft rim light");
    }

    #[tokio::test]
    async fn optimize_unchanged_text_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": " a cat "}}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .optimize_prompt("a cat", "anime")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    #[serial]
    fn api_key_resolution_order() {
        unsafe { std::env::set_var(API_KEY_ENV, "sk-env") };
        assert_eq!(resolve_api_key(&Some("sk-config".into())).as_deref(), Some("sk-config"));
        assert_eq!(resolve_api_key(&Some("  ".into())).as_deref(), Some("sk-env"));
        assert_eq!(resolve_api_key(&None).as_deref(), Some("sk-env"));
        unsafe { std::env::remove_var(API_KEY_ENV) };
        assert_eq!(resolve_api_key(&None), None);
    }

    #[test]
    #[serial]
    fn base_url_env_only_replaces_default() {
        unsafe { std::env::set_var(BASE_URL_ENV, "http://proxy.local/v1") };
        assert_eq!(
            resolve_base_url(lumen_config::model::DEFAULT_BASE_URL),
            "http://proxy.local/v1"
        );
        assert_eq!(resolve_base_url("http://custom/v1"), "http://custom/v1");
        unsafe { std::env::remove_var(BASE_URL_ENV) };
        assert_eq!(
            resolve_base_url(lumen_config::model::DEFAULT_BASE_URL),
            lumen_config::model::DEFAULT_BASE_URL
        );
    }
}
