// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gallery view model over the [`ImageStore`], kept fresh by store change
//! notifications and an optional periodic re-read.

use std::sync::Arc;
use std::time::Duration;

use lumen_core::{LumenError, StoredImage};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::{ImageStore, filter_by_prompt, paginate};

/// What the gallery currently shows.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryPage {
    pub items: Vec<StoredImage>,
    /// Records in the store.
    pub total: usize,
    /// Records matching the search term.
    pub matching: usize,
    pub favorites: usize,
    pub page: usize,
    pub has_more: bool,
}

pub struct GalleryView {
    store: Arc<ImageStore>,
    page_size: usize,
    snapshot: Vec<StoredImage>,
    search: String,
    page: usize,
}

impl GalleryView {
    /// An empty view; call [`GalleryView::refresh`] to load the store.
    pub fn new(store: Arc<ImageStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            snapshot: Vec::new(),
            search: String::new(),
            page: 1,
        }
    }

    pub async fn refresh(&mut self) {
        self.snapshot = self.store.list_all().await;
    }

    /// Changes the search term. A different term goes back to page 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search {
            self.search = term;
            self.page = 1;
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    /// Grows the window by one page if anything is hidden.
    pub fn load_more(&mut self) -> bool {
        if self.matching().len() > self.page * self.page_size {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn page(&self) -> GalleryPage {
        let matching = self.matching();
        let items = paginate(&matching, self.page, self.page_size).to_vec();
        GalleryPage {
            has_more: matching.len() > items.len(),
            total: self.snapshot.len(),
            matching: matching.len(),
            favorites: self.snapshot.iter().filter(|i| i.is_favorite).count(),
            page: self.page,
            items,
        }
    }

    /// Toggles a favorite and re-reads. On failure the view is re-read
    /// anyway so it shows what actually persisted.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<bool, LumenError> {
        let result = self.store.toggle_favorite(id).await;
        self.refresh().await;
        result
    }

    pub async fn delete(&mut self, id: &str) -> Result<bool, LumenError> {
        let result = self.store.delete(id).await;
        self.refresh().await;
        result
    }

    fn matching(&self) -> Vec<StoredImage> {
        filter_by_prompt(self.snapshot.clone(), &self.search)
    }
}

/// Keeps `view` in sync with `store` until `cancel` fires.
///
/// Every [`crate::StoreEvent`] triggers a refresh, as does each tick of
/// `interval` when one is given. The subscription is taken before this
/// returns, so no mutation made afterwards is missed.
pub fn spawn_gallery_sync(
    view: Arc<Mutex<GalleryView>>,
    store: &ImageStore,
    interval: Option<Duration>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut events = store.subscribe();
    let mut ticker = interval.filter(|d| !d.is_zero()).map(|period| {
        let mut t = tokio::time::interval(period);
        t.set_missed_tick_behavior(MissedTickBehavior::Skip);
        t
    });

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("gallery sync stopped");
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        debug!(?event, "store changed, refreshing gallery");
                        view.lock().await.refresh().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "gallery sync lagged, refreshing");
                        view.lock().await.refresh().await;
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = next_tick(&mut ticker) => {
                    view.lock().await.refresh().await;
                }
            }
        }
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use lumen_core::{ImageRecord, ImageSize, KeyValueBackend};

    fn record(id: &str, prompt: &str) -> ImageRecord {
        ImageRecord::text_to_image(id, "u", prompt, ImageSize::Square512, "realistic")
    }

    async fn seeded(n: usize) -> Arc<ImageStore> {
        let store = Arc::new(ImageStore::new(Arc::new(MemoryBackend::new()), 100));
        let prompts = ["red fox", "blue whale"];
        let batch = (0..n)
            .map(|i| record(&format!("i{i}"), prompts[i % 2]))
            .collect();
        store.insert_many(batch).await.unwrap();
        store
    }

    async fn wait_for(view: &Arc<Mutex<GalleryView>>, total: usize) -> bool {
        for _ in 0..100 {
            if view.lock().await.page().total == total {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn load_more_grows_window_until_exhausted() {
        let mut view = GalleryView::new(seeded(5).await, 2);
        view.refresh().await;

        let page = view.page();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);

        assert!(view.load_more());
        assert_eq!(view.page().items.len(), 4);
        assert!(view.load_more());
        let page = view.page();
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_more);
        assert!(!view.load_more());
        assert_eq!(view.page().page, 3);
    }

    #[tokio::test]
    async fn search_change_resets_page() {
        let mut view = GalleryView::new(seeded(8).await, 2);
        view.refresh().await;
        view.load_more();
        assert_eq!(view.page().page, 2);

        view.set_search("FOX");
        let page = view.page();
        assert_eq!(page.page, 1);
        assert_eq!(page.matching, 4);
        assert_eq!(page.total, 8);
        assert!(page.items.iter().all(|i| i.record.prompt == "red fox"));

        view.load_more();
        view.set_search("FOX");
        assert_eq!(view.page().page, 2);
    }

    #[tokio::test]
    async fn toggle_through_view_updates_snapshot() {
        let mut view = GalleryView::new(seeded(1).await, 10);
        view.refresh().await;
        assert!(view.toggle_favorite("i0").await.unwrap());
        assert_eq!(view.page().favorites, 1);
        assert!(view.delete("i0").await.unwrap());
        assert_eq!(view.page().total, 0);
    }

    #[tokio::test]
    async fn sync_refreshes_on_store_events() {
        let store = seeded(0).await;
        let view = Arc::new(Mutex::new(GalleryView::new(store.clone(), 10)));
        let cancel = CancellationToken::new();
        let handle = spawn_gallery_sync(view.clone(), &store, None, cancel.clone());

        store.insert_many(vec![record("a", "x")]).await.unwrap();
        assert!(wait_for(&view, 1).await);

        store.delete("a").await.unwrap();
        assert!(wait_for(&view, 0).await);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn sync_polls_for_writes_that_bypass_the_store() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(ImageStore::new(backend.clone(), 10));
        let view = Arc::new(Mutex::new(GalleryView::new(store.clone(), 10)));
        let cancel = CancellationToken::new();
        let handle = spawn_gallery_sync(
            view.clone(),
            &store,
            Some(Duration::from_millis(20)),
            cancel.clone(),
        );

        // Another writer sharing the backend, invisible to this store's channel.
        let other = ImageStore::new(backend, 10);
        other.insert_many(vec![record("b", "y")]).await.unwrap();
        assert!(wait_for(&view, 1).await);
        assert!(backend_has_images(store.backend().as_ref()).await);

        cancel.cancel();
        handle.await.unwrap();
    }

    async fn backend_has_images(backend: &dyn KeyValueBackend) -> bool {
        backend
            .get(crate::store::IMAGES_KEY)
            .await
            .unwrap()
            .is_some()
    }
}
