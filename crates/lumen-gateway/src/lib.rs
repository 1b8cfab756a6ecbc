// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway proxying image generation to the configured provider.
//!
//! Every route validates its input before the provider is called and renders
//! failures as `{error, details?, code, timestamp}` with a status derived
//! from the error kind.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::HealthResponse;
pub use server::{GatewayState, MAX_BODY_BYTES, bind, build_router, serve, start_server};
