// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request validation shared by all three request kinds.
//!
//! Each validator builds an ordered list of [`Check`]s and hands it to
//! [`validate_input`], which stops at the first violated check. Nothing here
//! touches the network.

use std::str::FromStr;

use crate::error::LumenError;
use crate::types::{GenerateRequest, GenerationParams, ImageSize, OptimizeRequest, ReferenceImage};

/// Longest prompt accepted for generation, in characters.
pub const MAX_GENERATE_PROMPT_CHARS: usize = 500;

/// Longest prompt accepted for optimization, in characters.
pub const MAX_OPTIMIZE_PROMPT_CHARS: usize = 1000;

/// Largest accepted reference image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const MIN_COUNT: i64 = 1;
pub const MAX_COUNT: i64 = 4;

/// One validation rule. `violated == true` rejects the request.
#[derive(Debug, Clone)]
pub struct Check {
    pub violated: bool,
    pub message: &'static str,
    pub details: Option<String>,
}

impl Check {
    pub fn new(violated: bool, message: &'static str) -> Self {
        Self {
            violated,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Fails with the first violated check, in order.
pub fn validate_input(checks: Vec<Check>) -> Result<(), LumenError> {
    match checks.into_iter().find(|c| c.violated) {
        Some(check) => Err(LumenError::validation(check.message, check.details)),
        None => Ok(()),
    }
}

/// Unvalidated image-to-image input, as read from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageToImageInput {
    pub image: Option<ReferenceImage>,
    pub prompt: String,
    pub size: String,
    pub count: i64,
    pub style: String,
    /// NaN when the submitted value did not parse.
    pub strength: f64,
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

fn prompt_too_long(prompt: &str, max: usize) -> bool {
    prompt.chars().count() > max
}

fn count_out_of_range(count: i64) -> bool {
    !(MIN_COUNT..=MAX_COUNT).contains(&count)
}

fn size_check(size: &str) -> Check {
    Check::new(ImageSize::from_str(size).is_err(), "unsupported image size")
        .with_details(format!("got '{size}'"))
}

fn parse_size(size: &str) -> Result<ImageSize, LumenError> {
    ImageSize::from_str(size)
        .map_err(|_| LumenError::validation("unsupported image size", Some(format!("got '{size}'"))))
}

/// Validates a text-to-image request into tagged parameters.
pub fn validate_generate(req: &GenerateRequest) -> Result<GenerationParams, LumenError> {
    validate_input(vec![
        Check::new(req.prompt.trim().is_empty(), "prompt must not be empty"),
        Check::new(
            prompt_too_long(&req.prompt, MAX_GENERATE_PROMPT_CHARS),
            "prompt is too long",
        )
        .with_details(format!("at most {MAX_GENERATE_PROMPT_CHARS} characters")),
        Check::new(count_out_of_range(req.count), "count must be between 1 and 4")
            .with_details(format!("got {}", req.count)),
        size_check(&req.size),
    ])?;

    Ok(GenerationParams::TextToImage {
        prompt: req.prompt.clone(),
        size: parse_size(&req.size)?,
        count: req.count as u8,
        style: req.style.clone(),
    })
}

/// Validates an image-to-image request into tagged parameters.
pub fn validate_image_to_image(input: ImageToImageInput) -> Result<GenerationParams, LumenError> {
    let (mime, len) = input
        .image
        .as_ref()
        .map(|img| (img.mime.clone(), img.bytes.len()))
        .unwrap_or_default();
    let missing = input.image.as_ref().is_none_or(|img| img.bytes.is_empty());

    validate_input(vec![
        Check::new(
            missing || input.prompt.trim().is_empty(),
            "an image and a prompt are required",
        ),
        Check::new(!is_image_mime(&mime), "uploaded file must be an image")
            .with_details(format!("got content type '{mime}'")),
        Check::new(len > MAX_IMAGE_BYTES, "image must be at most 10 MiB")
            .with_details(format!("got {len} bytes")),
        Check::new(
            prompt_too_long(&input.prompt, MAX_GENERATE_PROMPT_CHARS),
            "prompt is too long",
        )
        .with_details(format!("at most {MAX_GENERATE_PROMPT_CHARS} characters")),
        Check::new(count_out_of_range(input.count), "count must be between 1 and 4")
            .with_details(format!("got {}", input.count)),
        Check::new(
            !(0.0..=1.0).contains(&input.strength),
            "strength must be between 0 and 1",
        )
        .with_details(format!("got {}", input.strength)),
        size_check(&input.size),
    ])?;

    let size = parse_size(&input.size)?;
    let image = input
        .image
        .ok_or_else(|| LumenError::validation("an image and a prompt are required", None))?;

    Ok(GenerationParams::ImageToImage {
        prompt: input.prompt,
        size,
        count: input.count as u8,
        style: input.style,
        strength: input.strength,
        image,
    })
}

/// Validates a prompt-optimization request.
pub fn validate_optimize(req: &OptimizeRequest) -> Result<(), LumenError> {
    validate_input(vec![
        Check::new(req.prompt.trim().is_empty(), "prompt must not be empty"),
        Check::new(
            prompt_too_long(&req.prompt, MAX_OPTIMIZE_PROMPT_CHARS),
            "prompt is too long",
        )
        .with_details(format!("at most {MAX_OPTIMIZE_PROMPT_CHARS} characters")),
        Check::new(req.style.trim().is_empty(), "style must not be empty"),
    ])
}

/// Upload-time check of a selected file, reported as a FILE error.
pub fn check_image_file(mime: &str, len: usize) -> Result<(), LumenError> {
    if len == 0 {
        return Err(LumenError::file("image file is empty", None));
    }
    if !is_image_mime(mime) {
        return Err(LumenError::file(
            "uploaded file must be an image",
            Some(format!("got content type '{mime}'")),
        ));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(LumenError::file(
            "image must be at most 10 MiB",
            Some(format!("got {len} bytes")),
        ));
    }
    Ok(())
}
