// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side request lifecycle for Lumen.
//!
//! The [`GenerationController`] owns the generate/retry state machine with
//! synthetic progress, [`ImageUpload`] tracks the reference image for
//! image-to-image requests, and [`GatewayClient`] talks to a running gateway.

pub mod client;
pub mod controller;
pub mod shutdown;
pub mod state;
pub mod upload;

pub use client::GatewayClient;
pub use controller::{GenerationController, LifecycleSettings};
pub use shutdown::install_signal_handler;
pub use state::{GenerationOutcome, GenerationState, Phase, StateError};
pub use upload::{ImageUpload, UploadState};
