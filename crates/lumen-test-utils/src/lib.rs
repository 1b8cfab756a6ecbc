// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lumen integration tests.
//!
//! Provides a scripted image provider and a harness wiring it to a store and
//! a lifecycle controller, for fast, deterministic tests without external
//! services.
//!
//! # Components
//!
//! - [`MockImageProvider`] - image provider playing scripted outcomes
//! - [`TestHarness`] - provider + store + controller, timings shortened

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::{MockImageProvider, MockOutcome};
