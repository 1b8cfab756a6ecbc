// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so misspelled keys are
//! reported at startup instead of silently ignored.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Lumen configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LumenConfig {
    /// HTTP listener and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream image provider.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Deployment mode and the non-production placeholder path.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Local image store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gallery paging and refresh.
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// Generation lifecycle timings and retry budget.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// How the CLI reaches the gateway.
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Upstream OpenAI-compatible provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key. Falls back to the `OPENAI_API_KEY` environment variable.
    /// Absence is reported per request, not at startup.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL. `OPENAI_API_BASE_URL` overrides the compiled default.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Chat model used for prompt optimization.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_quality")]
    pub quality: String,

    /// Hard timeout applied to every upstream call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_optimize_max_tokens")]
    pub optimize_max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            image_model: default_image_model(),
            text_model: default_text_model(),
            quality: default_quality(),
            timeout_secs: default_timeout_secs(),
            optimize_max_tokens: default_optimize_max_tokens(),
        }
    }
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_text_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_optimize_max_tokens() -> u32 {
    200
}

/// Deployment mode.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Production,
    Development,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub mode: RuntimeMode,

    /// Substitute placeholder images when the upstream call fails or returns
    /// nothing. Only honored in development mode.
    #[serde(default)]
    pub placeholder_fallback: bool,

    #[serde(default = "default_placeholder_base_url")]
    pub placeholder_base_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::default(),
            placeholder_fallback: false,
            placeholder_base_url: default_placeholder_base_url(),
        }
    }
}

impl RuntimeConfig {
    /// Whether the placeholder path may activate.
    pub fn fallback_enabled(&self) -> bool {
        self.placeholder_fallback && self.mode == RuntimeMode::Development
    }
}

fn default_placeholder_base_url() -> String {
    "https://picsum.photos".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Maximum records retained; older ones are evicted.
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_images: default_max_images(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("lumen").join("lumen.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("lumen.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_max_images() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GalleryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Periodic re-read interval. `0` relies on change notifications only.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

fn default_refresh_interval_secs() -> u64 {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_tick_increment")]
    pub tick_increment: u8,

    /// Synthetic progress never passes this value while in flight.
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u8,

    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_optimize_debounce_ms")]
    pub optimize_debounce_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            tick_increment: default_tick_increment(),
            progress_cap: default_progress_cap(),
            success_display_ms: default_success_display_ms(),
            max_retries: default_max_retries(),
            optimize_debounce_ms: default_optimize_debounce_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_tick_increment() -> u8 {
    10
}

fn default_progress_cap() -> u8 {
    90
}

fn default_success_display_ms() -> u64 {
    3000
}

fn default_max_retries() -> u32 {
    3
}

fn default_optimize_debounce_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
        }
    }
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:3000".to_string()
}
