// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference-image selection for image-to-image generation.
//!
//! Independent of the generation phase: `idle -> uploading -> ready | error`.
//! A ready image owns a temporary preview file that is deleted when the image
//! is removed or replaced.

use std::io::Write;
use std::path::{Path, PathBuf};

use lumen_core::validation::{ImageToImageInput, check_image_file};
use lumen_core::{LumenError, ReferenceImage};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Ready { preview: PathBuf },
    Error(String),
}

#[derive(Debug, Default)]
pub struct ImageUpload {
    state: UploadState,
    image: Option<ReferenceImage>,
    preview: Option<NamedTempFile>,
}

impl ImageUpload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn image(&self) -> Option<&ReferenceImage> {
        self.image.as_ref()
    }

    /// Checks and stages a selected file, replacing any previous one.
    ///
    /// Returns the preview path on success. A rejected file leaves the
    /// upload in the error state with no image selected.
    pub fn select_image(
        &mut self,
        bytes: Vec<u8>,
        mime: &str,
        file_name: Option<String>,
    ) -> Result<&Path, LumenError> {
        self.remove_image();
        self.state = UploadState::Uploading;

        if let Err(err) = check_image_file(mime, bytes.len()) {
            self.state = UploadState::Error(err.user_message());
            return Err(err);
        }

        let preview = match write_preview(&bytes, mime) {
            Ok(file) => file,
            Err(err) => {
                self.state = UploadState::Error(err.user_message());
                return Err(err);
            }
        };
        debug!(bytes = bytes.len(), mime, preview = %preview.path().display(), "reference image ready");

        self.state = UploadState::Ready {
            preview: preview.path().to_path_buf(),
        };
        self.image = Some(ReferenceImage {
            bytes,
            mime: mime.to_string(),
            file_name,
        });
        let preview = self.preview.insert(preview);
        Ok(preview.path())
    }

    /// Drops the selected image and deletes its preview file.
    pub fn remove_image(&mut self) {
        if let Some(preview) = self.preview.take() {
            debug!(preview = %preview.path().display(), "releasing image preview");
        }
        self.image = None;
        self.state = UploadState::Idle;
    }

    /// Bundles the selected image with the form fields for validation.
    pub fn to_input(
        &self,
        prompt: impl Into<String>,
        size: impl Into<String>,
        count: i64,
        style: impl Into<String>,
        strength: f64,
    ) -> ImageToImageInput {
        ImageToImageInput {
            image: self.image.clone(),
            prompt: prompt.into(),
            size: size.into(),
            count,
            style: style.into(),
            strength,
        }
    }
}

fn write_preview(bytes: &[u8], mime: &str) -> Result<NamedTempFile, LumenError> {
    let suffix = mime
        .strip_prefix("image/")
        .map(|sub| format!(".{}", sub.split(['+', ';']).next().unwrap_or(sub)))
        .unwrap_or_default();
    let to_file_error =
        |e: std::io::Error| LumenError::file("could not prepare the image preview", Some(e.to_string()));

    let mut file = tempfile::Builder::new()
        .prefix("lumen-preview-")
        .suffix(&suffix)
        .tempfile()
        .map_err(to_file_error)?;
    file.write_all(bytes).map_err(to_file_error)?;
    file.flush().map_err(to_file_error)?;
    Ok(file)
}
