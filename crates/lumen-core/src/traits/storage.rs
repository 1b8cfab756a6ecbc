// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value persistence trait backing the local image store.

use async_trait::async_trait;

use crate::error::LumenError;
use crate::traits::adapter::PluginAdapter;

/// A string-keyed, string-valued persistence area.
///
/// `put_many` must apply all entries atomically: readers observe either none
/// or all of them.
#[async_trait]
pub trait KeyValueBackend: PluginAdapter {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, LumenError>;

    /// Writes every `(key, value)` pair in one atomic step.
    async fn put_many(&self, entries: Vec<(String, String)>) -> Result<(), LumenError>;

    /// Removes every listed key in one atomic step.
    async fn delete_many(&self, keys: Vec<String>) -> Result<(), LumenError>;
}
