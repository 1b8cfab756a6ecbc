// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image provider trait: anything that turns generation parameters into
//! canonical image records.

use async_trait::async_trait;

use crate::error::LumenError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerationParams, ImageRecord};

/// Adapter for image-generation backends.
///
/// Implemented by the upstream proxy (talking to the provider API) and by the
/// gateway HTTP client (talking to the proxy), so the lifecycle controller can
/// drive either.
#[async_trait]
pub trait ImageProvider: PluginAdapter {
    /// Generates images for validated parameters.
    ///
    /// May return an empty list; callers decide whether that is an error.
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<ImageRecord>, LumenError>;

    /// Returns an elaborated version of `prompt` for the given style.
    async fn optimize_prompt(&self, prompt: &str, style: &str) -> Result<String, LumenError>;
}
