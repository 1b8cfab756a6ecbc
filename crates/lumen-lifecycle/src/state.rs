// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observable generation state.

use lumen_core::{ErrorKind, ImageRecord, LumenError};
use serde::Serialize;
use strum::Display;

/// Where the current request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    InFlight,
    Success,
    Failed,
}

/// A displayable error: kind plus user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl From<&LumenError> for StateError {
    fn from(err: &LumenError) -> Self {
        let message = err.user_message();
        Self {
            kind: err.kind(),
            message: if message.trim().is_empty() {
                GENERIC_FAILURE.to_string()
            } else {
                message
            },
            details: err.details(),
        }
    }
}

/// Shown when an error carries no usable message.
pub const GENERIC_FAILURE: &str = "generation failed, please try again";

/// Snapshot published on every transition and progress tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GenerationState {
    pub phase: Phase,
    /// 0..=100. Synthetic while in flight.
    pub progress: u8,
    pub error: Option<StateError>,
    pub retry_count: u32,
    /// Sequence number of the attempt this snapshot belongs to.
    pub attempt: u64,
}

impl GenerationState {
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::InFlight
    }
}

/// Result of one generation attempt as seen by its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// This attempt was the latest one and its images were applied.
    Applied(Vec<ImageRecord>),
    /// A newer attempt started (or the session ended) before this one
    /// settled; its result was discarded.
    Superseded,
}

impl GenerationOutcome {
    pub fn images(&self) -> &[ImageRecord] {
        match self {
            GenerationOutcome::Applied(images) => images,
            GenerationOutcome::Superseded => &[],
        }
    }
}
