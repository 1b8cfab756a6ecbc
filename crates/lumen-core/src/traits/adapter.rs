// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and health surface shared by image providers and storage
//! backends.

use async_trait::async_trait;

use crate::error::LumenError;
use crate::types::{AdapterType, HealthStatus};

/// Common supertrait of [`ImageProvider`](crate::ImageProvider) and
/// [`KeyValueBackend`](crate::KeyValueBackend).
///
/// The gateway reports `health_check` of its provider on `/health` and calls
/// `shutdown` once the server has drained.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short label used in logs, e.g. `"openai"` or `"sqlite"`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Whether this is an image provider or a storage backend.
    fn adapter_type(&self) -> AdapterType;

    /// `Degraded` when the adapter can answer but not as configured, such as
    /// a provider with no API key.
    async fn health_check(&self) -> Result<HealthStatus, LumenError>;

    /// Releases connections held by the adapter.
    async fn shutdown(&self) -> Result<(), LumenError>;
}
