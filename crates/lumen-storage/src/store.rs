// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The local image store: a capped, most-recent-first list of image records
//! plus a favorites set, persisted as two JSON entries in a
//! [`KeyValueBackend`].
//!
//! Every mutation takes the single writer lock, performs one atomic backend
//! write and then publishes a [`StoreEvent`]. Read paths never fail: backend
//! or parse errors are logged and treated as an empty store. Mutations read
//! strictly instead: a backend read error aborts them before anything is
//! written, while unparseable entries still count as empty.

use std::collections::HashSet;
use std::sync::Arc;

use lumen_core::{ImageRecord, KeyValueBackend, LumenError, StoredImage};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

/// Backend key holding the JSON array of image records.
pub const IMAGES_KEY: &str = "lumen-image-generations";

/// Backend key holding the JSON array of favorite ids.
pub const FAVORITES_KEY: &str = "lumen-image-favorites";

/// Default record cap.
pub const DEFAULT_MAX_IMAGES: usize = 100;

const EVENT_CAPACITY: usize = 64;

/// Change notification published after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Inserted { ids: Vec<String> },
    Deleted { id: String },
    FavoriteToggled { id: String, is_favorite: bool },
    Cleared,
}

/// Summary figures for the gallery header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_images: usize,
    pub favorite_images: usize,
    pub storage_used_bytes: usize,
}

/// Capped image history with a favorites side relation.
pub struct ImageStore {
    backend: Arc<dyn KeyValueBackend>,
    max_images: usize,
    write_lock: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

impl ImageStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>, max_images: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            max_images: max_images.max(1),
            write_lock: Mutex::new(()),
            events,
        }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    /// Receiver for mutation notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Prepends `records`, evicting the oldest entries beyond the cap.
    ///
    /// An id already present is replaced by the new copy. Favorites of
    /// evicted records are dropped in the same write.
    pub async fn insert_many(&self, records: Vec<ImageRecord>) -> Result<(), LumenError> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        let mut seen = HashSet::new();
        let mut merged: Vec<ImageRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .collect();
        let inserted_len = merged.len();
        merged.extend(
            self.read_records()
                .await?
                .into_iter()
                .filter(|r| !seen.contains(&r.id)),
        );
        merged.truncate(self.max_images);

        let kept: HashSet<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        let mut favorites = self.read_favorites().await?;
        let before = favorites.len();
        favorites.retain(|id| kept.contains(id.as_str()));

        let mut entries = vec![(IMAGES_KEY.to_string(), encode(&merged)?)];
        if favorites.len() != before {
            entries.push((FAVORITES_KEY.to_string(), encode(&favorites)?));
        }
        self.write(entries).await?;

        let ids: Vec<String> = merged
            .iter()
            .take(inserted_len)
            .map(|r| r.id.clone())
            .collect();
        debug!(count = ids.len(), total = merged.len(), "images stored");
        self.publish(StoreEvent::Inserted { ids });
        Ok(())
    }

    /// Removes the record and its favorite mark. Returns whether a record
    /// was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, LumenError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        let mut favorites = self.read_favorites().await?;
        let records_before = records.len();
        let favorites_before = favorites.len();
        records.retain(|r| r.id != id);
        favorites.retain(|f| f != id);

        let removed = records.len() != records_before;
        if !removed && favorites.len() == favorites_before {
            return Ok(false);
        }

        self.write(vec![
            (IMAGES_KEY.to_string(), encode(&records)?),
            (FAVORITES_KEY.to_string(), encode(&favorites)?),
        ])
        .await?;

        debug!(id, "image deleted");
        self.publish(StoreEvent::Deleted { id: id.to_string() });
        Ok(removed)
    }

    /// Flips favorite membership and returns the new state.
    ///
    /// An id with no record is left alone and reports `false`.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool, LumenError> {
        let _guard = self.write_lock.lock().await;

        let records = self.read_records().await?;
        if !records.iter().any(|r| r.id == id) {
            debug!(id, "favorite toggle ignored, no such image");
            return Ok(false);
        }

        let mut favorites = self.read_favorites().await?;
        let is_favorite = match favorites.iter().position(|f| f == id) {
            Some(pos) => {
                favorites.remove(pos);
                false
            }
            None => {
                favorites.push(id.to_string());
                true
            }
        };

        self.write(vec![(FAVORITES_KEY.to_string(), encode(&favorites)?)])
            .await?;

        self.publish(StoreEvent::FavoriteToggled {
            id: id.to_string(),
            is_favorite,
        });
        Ok(is_favorite)
    }

    /// Every record, newest first, with its favorite flag.
    pub async fn list_all(&self) -> Vec<StoredImage> {
        let records = self.load_records().await;
        let favorites: HashSet<String> = self.load_favorites().await.into_iter().collect();
        records
            .into_iter()
            .map(|record| {
                let is_favorite = favorites.contains(&record.id);
                StoredImage {
                    record,
                    is_favorite,
                }
            })
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<StoredImage> {
        self.list_all()
            .await
            .into_iter()
            .find(|img| img.record.id == id)
    }

    /// Records whose prompt contains `term`, ignoring case.
    pub async fn search(&self, term: &str) -> Vec<StoredImage> {
        filter_by_prompt(self.list_all().await, term)
    }

    /// Removes both entries.
    pub async fn clear(&self) -> Result<(), LumenError> {
        let _guard = self.write_lock.lock().await;
        self.backend
            .delete_many(vec![IMAGES_KEY.to_string(), FAVORITES_KEY.to_string()])
            .await
            .inspect_err(|e| warn!(error = %e, "failed to clear image store"))?;
        self.publish(StoreEvent::Cleared);
        Ok(())
    }

    pub async fn stats(&self) -> StoreStats {
        let images = self.list_all().await;
        let favorite_images = images.iter().filter(|i| i.is_favorite).count();
        let storage_used_bytes = self.raw_len(IMAGES_KEY).await + self.raw_len(FAVORITES_KEY).await;
        StoreStats {
            total_images: images.len(),
            favorite_images,
            storage_used_bytes,
        }
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>, LumenError> {
        self.backend
            .get(key)
            .await
            .inspect_err(|e| warn!(key, error = %e, "failed to read image store entry"))
    }

    async fn raw(&self, key: &str) -> Option<String> {
        self.read_raw(key).await.ok().flatten()
    }

    async fn raw_len(&self, key: &str) -> usize {
        self.raw(key).await.map_or(0, |v| v.len())
    }

    async fn load_records(&self) -> Vec<ImageRecord> {
        parse_records(self.raw(IMAGES_KEY).await)
    }

    async fn load_favorites(&self) -> Vec<String> {
        parse_favorites(self.raw(FAVORITES_KEY).await)
    }

    async fn read_records(&self) -> Result<Vec<ImageRecord>, LumenError> {
        Ok(parse_records(self.read_raw(IMAGES_KEY).await?))
    }

    async fn read_favorites(&self) -> Result<Vec<String>, LumenError> {
        Ok(parse_favorites(self.read_raw(FAVORITES_KEY).await?))
    }

    async fn write(&self, entries: Vec<(String, String)>) -> Result<(), LumenError> {
        self.backend
            .put_many(entries)
            .await
            .inspect_err(|e| warn!(error = %e, "image store write failed"))
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn parse_records(raw: Option<String>) -> Vec<ImageRecord> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<ImageRecord>>(&raw) {
        Ok(records) => {
            let before = records.len();
            let records: Vec<ImageRecord> =
                records.into_iter().filter(ImageRecord::is_consistent).collect();
            if records.len() != before {
                warn!(
                    dropped = before - records.len(),
                    "dropped stored images with inconsistent strength"
                );
            }
            records
        }
        Err(e) => {
            warn!(key = IMAGES_KEY, error = %e, "stored images are unreadable, treating as empty");
            Vec::new()
        }
    }
}

fn parse_favorites(raw: Option<String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key = FAVORITES_KEY, error = %e, "stored favorites are unreadable, treating as empty");
        Vec::new()
    })
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, LumenError> {
    serde_json::to_string(value).map_err(LumenError::storage)
}

/// Keeps items whose prompt contains `term` case-insensitively. A blank term
/// keeps everything.
pub fn filter_by_prompt(items: Vec<StoredImage>, term: &str) -> Vec<StoredImage> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|img| img.record.prompt.to_lowercase().contains(&needle))
        .collect()
}

/// The "load more" window: the first `page * page_size` items.
///
/// Pages are 1-based; page 0 is treated as page 1.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let end = page.max(1).saturating_mul(page_size).min(items.len());
    &items[..end]
}
