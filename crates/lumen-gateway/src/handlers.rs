// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /api/generate, POST /api/image-to-image,
//! POST /api/optimize-prompt and GET /health.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartRejection},
        rejection::JsonRejection,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lumen_core::types::{GenerateRequest, GenerateResponse, OptimizeRequest, OptimizeResponse};
use lumen_core::validation::{
    ImageToImageInput, validate_generate, validate_image_to_image, validate_optimize,
};
use lumen_core::{GenerationParams, HealthStatus, ImageRecord, ImageSource, LumenError, ReferenceImage};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Health label reported by the image provider.
    pub provider: String,
}

/// POST /api/generate
pub async fn post_generate(
    State(state): State<GatewayState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(req) = body?;
    let params = validate_generate(&req)?;
    let images = run_generation(&state, &params).await?;
    Ok(Json(GenerateResponse {
        success: true,
        count: images.len(),
        images,
        mode: None,
    }))
}

/// POST /api/image-to-image (multipart form).
pub async fn post_image_to_image(
    State(state): State<GatewayState>,
    form: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let input = read_image_form(form?).await?;
    let params = validate_image_to_image(input)?;
    let images = run_generation(&state, &params).await?;
    Ok(Json(GenerateResponse {
        success: true,
        count: images.len(),
        images,
        mode: Some(ImageSource::ImageToImage),
    }))
}

/// POST /api/optimize-prompt
pub async fn post_optimize_prompt(
    State(state): State<GatewayState>,
    body: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let Json(req) = body?;
    validate_optimize(&req)?;
    let optimized = state
        .provider
        .optimize_prompt(req.prompt.trim(), &req.style)
        .await?;
    Ok(Json(OptimizeResponse {
        success: true,
        optimized_prompt: optimized,
        original_prompt: req.prompt,
        style: req.style,
    }))
}

/// GET /health
///
/// Always 200; a failing provider check reports `degraded`.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let provider = match state.provider.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    let status = match provider {
        HealthStatus::Healthy => "healthy",
        _ => "degraded",
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        provider: provider.label().to_string(),
    })
}

async fn run_generation(
    state: &GatewayState,
    params: &GenerationParams,
) -> Result<Vec<ImageRecord>, LumenError> {
    info!(
        source = %params.source(),
        size = %params.size(),
        count = params.count(),
        style = params.style(),
        "generating images"
    );
    let images = state.provider.generate(params).await?;
    if images.is_empty() {
        return Err(LumenError::api("no valid images returned", 502, None));
    }
    debug!(returned = images.len(), "generation complete");
    Ok(images)
}

/// Reads the image-to-image form into unvalidated input.
///
/// Missing text fields stay empty and a missing `count` means 1. Numbers are
/// read from their leading numeric prefix (`"2.5"` counts as 2, `"0.5x"` as
/// 0.5). A `count` with no digits becomes 0 and a missing or digitless
/// `strength` becomes NaN, so validation rejects both.
async fn read_image_form(mut form: Multipart) -> Result<ImageToImageInput, ApiError> {
    let mut input = ImageToImageInput {
        image: None,
        prompt: String::new(),
        size: String::new(),
        count: 1,
        style: String::new(),
        strength: f64::NAN,
    };

    while let Some(field) = form.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => input.image = Some(read_image_field(field).await?),
            "prompt" => input.prompt = field.text().await?,
            "size" => input.size = field.text().await?,
            "style" => input.style = field.text().await?,
            "count" => input.count = leading_int(&field.text().await?).unwrap_or(0),
            "strength" => {
                input.strength = leading_float(&field.text().await?).unwrap_or(f64::NAN)
            }
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(input)
}

/// Length of the run of ASCII digits at the start of `s`.
fn digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn sign(s: &str) -> usize {
    usize::from(s.starts_with(['+', '-']))
}

/// Integer value of the longest `[+-]digits` prefix, ignoring leading
/// whitespace.
fn leading_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let end = sign(s) + digits(&s[sign(s)..]);
    if end == sign(s) {
        return None;
    }
    s[..end].parse().ok()
}

/// Value of the longest decimal prefix (`[+-]digits[.digits][e[+-]digits]`),
/// ignoring leading whitespace.
fn leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let mut end = sign(s);
    let int_digits = digits(&s[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if s[end..].starts_with('.') {
        frac_digits = digits(&s[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if s[end..].starts_with(['e', 'E']) {
        let exp_start = end + 1;
        let exp_sign = sign(&s[exp_start..]);
        let exp_digits = digits(&s[exp_start + exp_sign..]);
        if exp_digits > 0 {
            end = exp_start + exp_sign + exp_digits;
        }
    }
    s[..end].parse().ok()
}

async fn read_image_field(field: Field<'_>) -> Result<ReferenceImage, LumenError> {
    let mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = field.file_name().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| LumenError::file("could not read the uploaded image", Some(e.body_text())))?;
    Ok(ReferenceImage {
        bytes: bytes.to_vec(),
        mime,
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_read_their_leading_digits() {
        assert_eq!(leading_int("3"), Some(3));
        assert_eq!(leading_int(" 2.5"), Some(2));
        assert_eq!(leading_int("4 images"), Some(4));
        assert_eq!(leading_int("-1"), Some(-1));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn floats_read_their_leading_decimal() {
        assert_eq!(leading_float("0.5x"), Some(0.5));
        assert_eq!(leading_float(".25"), Some(0.25));
        assert_eq!(leading_float("1."), Some(1.0));
        assert_eq!(leading_float("5e-1"), Some(0.5));
        assert_eq!(leading_float("2e"), Some(2.0));
        assert_eq!(leading_float(" -0.3 "), Some(-0.3));
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("x0.5"), None);
        assert_eq!(leading_float("NaN"), None);
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            provider: "healthy".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["uptime_secs"], 42);
        assert_eq!(json["provider"], "healthy");
    }

    #[test]
    fn generate_response_omits_mode_for_text_route() {
        let resp = GenerateResponse {
            success: true,
            images: vec![],
            count: 0,
            mode: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("mode").is_none());

        let resp = GenerateResponse {
            mode: Some(ImageSource::ImageToImage),
            ..resp
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["mode"], "image-to-image");
    }
}
