// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock image provider for deterministic testing.
//!
//! `MockImageProvider` implements `ImageProvider` with scripted outcomes,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lumen_core::{
    AdapterType, GenerationParams, HealthStatus, ImageProvider, ImageRecord, LumenError,
    PluginAdapter,
};

/// What the next provider call does.
#[derive(Debug)]
pub enum MockOutcome {
    /// Return `count` images built from the request parameters.
    Images,
    /// Return an empty list.
    Empty,
    /// Fail with the given error.
    Fail(LumenError),
    /// Optimization result text.
    Text(String),
    /// Wait, then behave like the wrapped outcome.
    Delayed(Duration, Box<MockOutcome>),
}

impl MockOutcome {
    pub fn delayed(delay: Duration, outcome: MockOutcome) -> Self {
        MockOutcome::Delayed(delay, Box::new(outcome))
    }
}

/// A mock provider that plays scripted outcomes in FIFO order.
///
/// When the queue is empty, `generate` returns `count` images and
/// `optimize_prompt` returns `"{prompt}, refined"`.
pub struct MockImageProvider {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    requests: Mutex<Vec<GenerationParams>>,
    generate_calls: AtomicUsize,
    optimize_calls: AtomicUsize,
    minted: AtomicUsize,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::with_outcomes(Vec::new())
    }

    pub fn with_outcomes(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            requests: Mutex::new(Vec::new()),
            generate_calls: AtomicUsize::new(0),
            optimize_calls: AtomicUsize::new(0),
            minted: AtomicUsize::new(0),
        }
    }

    pub async fn push(&self, outcome: MockOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn optimize_calls(&self) -> usize {
        self.optimize_calls.load(Ordering::SeqCst)
    }

    /// Parameters of every `generate` call, oldest first.
    pub async fn requests(&self) -> Vec<GenerationParams> {
        self.requests.lock().await.clone()
    }

    async fn next_outcome(&self) -> Option<MockOutcome> {
        let mut outcome = self.outcomes.lock().await.pop_front();
        loop {
            match outcome {
                Some(MockOutcome::Delayed(delay, inner)) => {
                    tokio::time::sleep(delay).await;
                    outcome = Some(*inner);
                }
                other => return other,
            }
        }
    }

    fn mint(&self, params: &GenerationParams) -> Vec<ImageRecord> {
        (0..usize::from(params.count()))
            .map(|index| {
                let n = self.minted.fetch_add(1, Ordering::SeqCst);
                let id = format!("mock_{n}_{index}");
                let url = format!("https://mock.invalid/{id}.png");
                match params {
                    GenerationParams::TextToImage {
                        prompt,
                        size,
                        style,
                        ..
                    } => ImageRecord::text_to_image(id, url, prompt.clone(), *size, style.clone()),
                    GenerationParams::ImageToImage {
                        prompt,
                        size,
                        style,
                        strength,
                        ..
                    } => ImageRecord::image_to_image(
                        format!("img2img_{id}"),
                        url,
                        prompt.clone(),
                        *size,
                        style.clone(),
                        *strength,
                    ),
                }
            })
            .collect()
    }
}

impl Default for MockImageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockImageProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LumenError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LumenError> {
        Ok(())
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<ImageRecord>, LumenError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(params.clone());
        match self.next_outcome().await {
            Some(MockOutcome::Empty) => Ok(Vec::new()),
            Some(MockOutcome::Fail(err)) => Err(err),
            _ => Ok(self.mint(params)),
        }
    }

    async fn optimize_prompt(&self, prompt: &str, _style: &str) -> Result<String, LumenError> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_outcome().await {
            Some(MockOutcome::Text(text)) => Ok(text),
            Some(MockOutcome::Fail(err)) => Err(err),
            _ => Ok(format!("{prompt}, refined")),
        }
    }
}
