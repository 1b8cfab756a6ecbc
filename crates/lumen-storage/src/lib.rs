// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local persistence for Lumen.
//!
//! Provides the key-value backends (WAL-mode SQLite with embedded migrations,
//! or in-memory), the capped [`ImageStore`] with its favorites relation and
//! change notifications, and the [`GalleryView`] model that browses it.

pub mod backend;
pub mod database;
pub mod gallery;
pub mod migrations;
pub mod store;

use std::sync::Arc;

use lumen_config::model::StorageConfig;
use lumen_core::{KeyValueBackend, LumenError};

pub use backend::{MemoryBackend, SqliteBackend};
pub use database::Database;
pub use gallery::{GalleryPage, GalleryView, spawn_gallery_sync};
pub use store::{
    FAVORITES_KEY, IMAGES_KEY, ImageStore, StoreEvent, StoreStats, filter_by_prompt, paginate,
};

/// Opens the SQLite-backed store described by `config`.
pub async fn open_store(config: &StorageConfig) -> Result<ImageStore, LumenError> {
    let backend: Arc<dyn KeyValueBackend> =
        Arc::new(SqliteBackend::open(&config.database_path).await?);
    Ok(ImageStore::new(backend, config.max_images))
}

/// A store that lives only as long as the process.
pub fn memory_store(max_images: usize) -> ImageStore {
    ImageStore::new(Arc::new(MemoryBackend::new()), max_images)
}
