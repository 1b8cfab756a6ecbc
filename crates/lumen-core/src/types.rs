// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical data model shared by the provider proxy, the store and the
//! gateway.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Short label used in health responses.
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

/// The fixed set of output dimensions the generator accepts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum ImageSize {
    #[strum(serialize = "512x512")]
    #[serde(rename = "512x512")]
    Square512,
    #[strum(serialize = "768x768")]
    #[serde(rename = "768x768")]
    Square768,
    #[strum(serialize = "1024x1024")]
    #[serde(rename = "1024x1024")]
    Square1024,
    #[strum(serialize = "576x1024")]
    #[serde(rename = "576x1024")]
    Portrait576,
    #[strum(serialize = "720x1280")]
    #[serde(rename = "720x1280")]
    Portrait720,
    #[strum(serialize = "1024x576")]
    #[serde(rename = "1024x576")]
    Wide1024,
    #[strum(serialize = "1280x720")]
    #[serde(rename = "1280x720")]
    Wide1280,
    #[strum(serialize = "1920x1080")]
    #[serde(rename = "1920x1080")]
    FullHd,
    #[strum(serialize = "1024x768")]
    #[serde(rename = "1024x768")]
    Standard1024,
    #[strum(serialize = "1152x896")]
    #[serde(rename = "1152x896")]
    Standard1152,
    #[strum(serialize = "1792x1024")]
    #[serde(rename = "1792x1024")]
    Landscape1792,
    #[strum(serialize = "1024x1792")]
    #[serde(rename = "1024x1792")]
    Portrait1792,
}

impl ImageSize {
    fn dimensions(self) -> (u32, u32) {
        match self {
            ImageSize::Square512 => (512, 512),
            ImageSize::Square768 => (768, 768),
            ImageSize::Square1024 => (1024, 1024),
            ImageSize::Portrait576 => (576, 1024),
            ImageSize::Portrait720 => (720, 1280),
            ImageSize::Wide1024 => (1024, 576),
            ImageSize::Wide1280 => (1280, 720),
            ImageSize::FullHd => (1920, 1080),
            ImageSize::Standard1024 => (1024, 768),
            ImageSize::Standard1152 => (1152, 896),
            ImageSize::Landscape1792 => (1792, 1024),
            ImageSize::Portrait1792 => (1024, 1792),
        }
    }

    pub fn width(self) -> u32 {
        self.dimensions().0
    }

    pub fn height(self) -> u32 {
        self.dimensions().1
    }

    /// Wire form, e.g. `"1024x1024"`.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Which generation mode produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ImageSource {
    TextToImage,
    ImageToImage,
}

/// One generated image.
///
/// `strength` is present exactly when `source` is [`ImageSource::ImageToImage`];
/// the per-mode constructors are the only way this crate builds records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    pub prompt: String,
    pub timestamp: String,
    pub size: ImageSize,
    pub style: String,
    #[serde(default = "default_source")]
    pub source: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

fn default_source() -> ImageSource {
    ImageSource::TextToImage
}

impl ImageRecord {
    /// A text-to-image record stamped with the current instant.
    pub fn text_to_image(
        id: impl Into<String>,
        url: impl Into<String>,
        prompt: impl Into<String>,
        size: ImageSize,
        style: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            prompt: prompt.into(),
            timestamp: now_iso8601(),
            size,
            style: style.into(),
            source: ImageSource::TextToImage,
            strength: None,
        }
    }

    /// An image-to-image record stamped with the current instant.
    pub fn image_to_image(
        id: impl Into<String>,
        url: impl Into<String>,
        prompt: impl Into<String>,
        size: ImageSize,
        style: impl Into<String>,
        strength: f64,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            prompt: prompt.into(),
            timestamp: now_iso8601(),
            size,
            style: style.into(),
            source: ImageSource::ImageToImage,
            strength: Some(strength),
        }
    }

    /// Whether `strength` agrees with `source`.
    ///
    /// Records deserialized from persisted state may violate this; the store
    /// drops such records on read.
    pub fn is_consistent(&self) -> bool {
        match self.source {
            ImageSource::TextToImage => self.strength.is_none(),
            ImageSource::ImageToImage => self.strength.is_some(),
        }
    }
}

/// A record as read back from the store, with its derived favorite flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    #[serde(flatten)]
    pub record: ImageRecord,
    pub is_favorite: bool,
}

/// Reference image supplied to image-to-image generation.
#[derive(Clone, PartialEq)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: Option<String>,
}

impl fmt::Debug for ReferenceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceImage")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("mime", &self.mime)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Validated, mode-tagged generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationParams {
    TextToImage {
        prompt: String,
        size: ImageSize,
        count: u8,
        style: String,
    },
    ImageToImage {
        prompt: String,
        size: ImageSize,
        count: u8,
        style: String,
        strength: f64,
        image: ReferenceImage,
    },
}

impl GenerationParams {
    pub fn prompt(&self) -> &str {
        match self {
            GenerationParams::TextToImage { prompt, .. }
            | GenerationParams::ImageToImage { prompt, .. } => prompt,
        }
    }

    pub fn size(&self) -> ImageSize {
        match self {
            GenerationParams::TextToImage { size, .. }
            | GenerationParams::ImageToImage { size, .. } => *size,
        }
    }

    pub fn count(&self) -> u8 {
        match self {
            GenerationParams::TextToImage { count, .. }
            | GenerationParams::ImageToImage { count, .. } => *count,
        }
    }

    pub fn style(&self) -> &str {
        match self {
            GenerationParams::TextToImage { style, .. }
            | GenerationParams::ImageToImage { style, .. } => style,
        }
    }

    pub fn source(&self) -> ImageSource {
        match self {
            GenerationParams::TextToImage { .. } => ImageSource::TextToImage,
            GenerationParams::ImageToImage { .. } => ImageSource::ImageToImage,
        }
    }
}

// --- Wire types of the HTTP surface ---

/// Body of `POST /api/generate`, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub size: String,
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default)]
    pub style: String,
}

fn default_count() -> i64 {
    1
}

/// Body of `POST /api/optimize-prompt`, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub style: String,
}

/// Success body of both generation routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub images: Vec<ImageRecord>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ImageSource>,
}

/// Success body of `POST /api/optimize-prompt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub success: bool,
    pub optimized_prompt: String,
    pub original_prompt: String,
    pub style: String,
}

/// Error body rendered for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub code: String,
    pub timestamp: String,
}

/// Current UTC instant as ISO-8601 with millisecond precision.
pub fn now_iso8601() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn image_size_parses_wire_form() {
        assert_eq!(ImageSize::from_str("1024x1024").unwrap(), ImageSize::Square1024);
        assert_eq!(ImageSize::from_str("1792x1024").unwrap().width(), 1792);
        assert!(ImageSize::from_str("1000x1000").is_err());
        assert!(ImageSize::from_str("").is_err());
    }

    #[test]
    fn image_size_dimensions_match_label() {
        assert_eq!(ImageSize::iter().count(), 12);
        for size in ImageSize::iter() {
            assert_eq!(
                size.as_str(),
                format!("{}x{}", size.width(), size.height())
            );
        }
    }

    #[test]
    fn text_record_omits_strength() {
        let record = ImageRecord::text_to_image(
            "1_0",
            "https://img/1.png",
            "a cat",
            ImageSize::Square1024,
            "anime",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "text-to-image");
        assert_eq!(json["size"], "1024x1024");
        assert!(json.get("strength").is_none());
        assert!(record.is_consistent());
    }

    #[test]
    fn image_to_image_record_carries_strength() {
        let record = ImageRecord::image_to_image(
            "img2img_1_0",
            "https://img/1.png",
            "a dog",
            ImageSize::Square512,
            "sketch",
            0.75,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "image-to-image");
        assert_eq!(json["strength"], 0.75);
        assert!(record.is_consistent());
    }

    #[test]
    fn legacy_record_without_source_is_text_to_image() {
        let json = r#"{"id":"1_0","url":"u","prompt":"p","timestamp":"t","size":"512x512","style":"anime"}"#;
        let record: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source, ImageSource::TextToImage);
        assert!(record.is_consistent());
    }

    #[test]
    fn stored_image_flattens_favorite_flag() {
        let stored = StoredImage {
            record: ImageRecord::text_to_image("1_0", "u", "p", ImageSize::Square512, "anime"),
            is_favorite: true,
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["isFavorite"], true);
        assert_eq!(json["id"], "1_0");
    }

    #[test]
    fn timestamp_is_iso8601_utc() {
        let ts = now_iso8601();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn reference_image_debug_hides_bytes() {
        let image = ReferenceImage {
            bytes: vec![0u8; 2048],
            mime: "image/png".into(),
            file_name: Some("cat.png".into()),
        };
        let debug = format!("{image:?}");
        assert!(debug.contains("2048 bytes"));
    }

    #[test]
    fn generate_request_defaults_count_to_one() {
        let req: GenerateRequest = serde_json::from_str(r#"{"prompt":"x","size":"512x512"}"#).unwrap();
        assert_eq!(req.count, 1);
        assert_eq!(req.style, "");
    }
}
