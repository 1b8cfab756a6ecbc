// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Lumen.
//!
//! This crate provides the error taxonomy, the canonical image model, the
//! request validation layer, the style table and the adapter traits used
//! throughout the Lumen workspace.

pub mod error;
pub mod styles;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, LumenError};
pub use styles::{STYLES, StyleEntry, augment_prompt, style_modifier};
pub use types::{
    AdapterType, GenerationParams, HealthStatus, ImageRecord, ImageSize, ImageSource,
    ReferenceImage, StoredImage,
};

pub use traits::{ImageProvider, KeyValueBackend, PluginAdapter};
