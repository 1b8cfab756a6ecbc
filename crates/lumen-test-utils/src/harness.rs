// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a mock provider, an image store and a lifecycle
//! controller wired together, with timings shortened for tests.

use std::sync::Arc;
use std::time::Duration;

use lumen_config::LumenConfig;
use lumen_core::{ImageProvider, KeyValueBackend, LumenError};
use lumen_lifecycle::{GenerationController, LifecycleSettings};
use lumen_storage::{ImageStore, MemoryBackend, SqliteBackend};

use crate::mock_provider::{MockImageProvider, MockOutcome};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    outcomes: Vec<MockOutcome>,
    settings: LifecycleSettings,
    max_images: usize,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            settings: TestHarness::fast_settings(),
            max_images: LumenConfig::default().storage.max_images,
            sqlite: false,
        }
    }

    /// Scripted provider outcomes, played in order.
    pub fn with_outcomes(mut self, outcomes: Vec<MockOutcome>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn with_settings(mut self, settings: LifecycleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.max_images = max_images;
        self
    }

    /// Back the store with SQLite in a temp directory instead of memory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, LumenError> {
        let temp_dir = tempfile::TempDir::new().map_err(LumenError::storage)?;

        let backend: Arc<dyn KeyValueBackend> = if self.sqlite {
            let db_path = temp_dir.path().join("test.db");
            Arc::new(SqliteBackend::open(&db_path.to_string_lossy()).await?)
        } else {
            Arc::new(MemoryBackend::new())
        };
        let store = Arc::new(ImageStore::new(backend, self.max_images));

        let provider = Arc::new(MockImageProvider::with_outcomes(self.outcomes));
        let controller = Arc::new(
            GenerationController::new(
                provider.clone() as Arc<dyn ImageProvider>,
                self.settings,
            )
            .with_store(store.clone()),
        );

        Ok(TestHarness {
            provider,
            store,
            controller,
            _temp_dir: temp_dir,
        })
    }
}

/// A mock provider, a store and a controller persisting into that store.
pub struct TestHarness {
    pub provider: Arc<MockImageProvider>,
    pub store: Arc<ImageStore>,
    pub controller: Arc<GenerationController>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default lifecycle behavior with every timer scaled down 50x.
    pub fn fast_settings() -> LifecycleSettings {
        LifecycleSettings {
            tick_interval: Duration::from_millis(10),
            success_display: Duration::from_millis(60),
            optimize_debounce: Duration::from_millis(10),
            ..LifecycleSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{GenerationParams, ImageSize};
    use lumen_lifecycle::{GenerationOutcome, Phase};

    fn params() -> GenerationParams {
        GenerationParams::TextToImage {
            prompt: "a lighthouse".into(),
            size: ImageSize::Wide1024,
            count: 2,
            style: "watercolor".into(),
        }
    }

    #[tokio::test]
    async fn harness_wires_controller_to_store() {
        let harness = TestHarness::builder().build().await.unwrap();
        let outcome = harness.controller.generate(params()).await.unwrap();

        assert!(matches!(outcome, GenerationOutcome::Applied(ref images) if images.len() == 2));
        assert_eq!(harness.controller.state().phase, Phase::Success);
        assert_eq!(harness.store.list_all().await.len(), 2);
    }

    #[tokio::test]
    async fn sqlite_harness_persists() {
        let harness = TestHarness::builder()
            .with_sqlite()
            .with_max_images(3)
            .build()
            .await
            .unwrap();
        harness.controller.generate(params()).await.unwrap();
        harness.controller.generate(params()).await.unwrap();
        assert_eq!(harness.store.list_all().await.len(), 3);
    }
}
