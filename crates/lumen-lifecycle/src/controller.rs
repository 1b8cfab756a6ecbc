// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation lifecycle controller.
//!
//! Drives one request at a time through `idle -> in-flight -> success|failed`,
//! publishing every transition on a [`watch`] channel. Two timelines run per
//! attempt: a cancellable ticker producing synthetic progress, and the real
//! provider call. Completion always stops the ticker before the terminal
//! transition.
//!
//! Attempts are numbered. Only the latest attempt may change state; a
//! completion belonging to an older attempt is discarded and reported as
//! [`GenerationOutcome::Superseded`]. All timers hang off a session
//! [`CancellationToken`], so [`GenerationController::shutdown`] (or drop)
//! silences them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lumen_config::model::LifecycleConfig;
use lumen_core::validation::{
    ImageToImageInput, validate_generate, validate_image_to_image, validate_optimize,
};
use lumen_core::types::{GenerateRequest, OptimizeRequest};
use lumen_core::{GenerationParams, ImageProvider, ImageRecord, LumenError};
use lumen_storage::ImageStore;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{GenerationOutcome, GenerationState, Phase, StateError};

/// Timing and retry knobs.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub tick_interval: Duration,
    pub tick_increment: u8,
    pub progress_cap: u8,
    pub success_display: Duration,
    pub max_retries: u32,
    pub optimize_debounce: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from(&LifecycleConfig::default())
    }
}

impl From<&LifecycleConfig> for LifecycleSettings {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            tick_increment: config.tick_increment,
            progress_cap: config.progress_cap.min(100),
            success_display: Duration::from_millis(config.success_display_ms),
            max_retries: config.max_retries,
            optimize_debounce: Duration::from_millis(config.optimize_debounce_ms),
        }
    }
}

#[derive(Default)]
struct AttemptSlot {
    timers: Option<CancellationToken>,
    last_params: Option<GenerationParams>,
}

pub struct GenerationController {
    provider: Arc<dyn ImageProvider>,
    store: Option<Arc<ImageStore>>,
    settings: LifecycleSettings,
    state: Arc<watch::Sender<GenerationState>>,
    seq: AtomicU64,
    attempt: Mutex<AttemptSlot>,
    pending_optimize: Mutex<Option<CancellationToken>>,
    session: CancellationToken,
}

impl GenerationController {
    pub fn new(provider: Arc<dyn ImageProvider>, settings: LifecycleSettings) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            provider,
            store: None,
            settings,
            state: Arc::new(state),
            seq: AtomicU64::new(0),
            attempt: Mutex::new(AttemptSlot::default()),
            pending_optimize: Mutex::new(None),
            session: CancellationToken::new(),
        }
    }

    /// Persists every applied batch into `store`.
    pub fn with_store(mut self, store: Arc<ImageStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Validates a text-to-image request and runs it.
    ///
    /// A validation failure moves to `failed` without calling the provider.
    pub async fn generate_text(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationOutcome, LumenError> {
        match validate_generate(request) {
            Ok(params) => self.generate(params).await,
            Err(err) => Err(self.reject(err).await),
        }
    }

    /// Validates an image-to-image request and runs it.
    pub async fn generate_from_image(
        &self,
        input: ImageToImageInput,
    ) -> Result<GenerationOutcome, LumenError> {
        match validate_image_to_image(input) {
            Ok(params) => self.generate(params).await,
            Err(err) => Err(self.reject(err).await),
        }
    }

    /// Starts a fresh attempt, resetting the retry count.
    pub async fn generate(&self, params: GenerationParams) -> Result<GenerationOutcome, LumenError> {
        self.run_attempt(params, 0).await
    }

    /// Re-runs the last failed request.
    ///
    /// Refused without a provider call once the retry budget is spent.
    pub async fn retry(&self) -> Result<GenerationOutcome, LumenError> {
        let current = self.state();
        if current.phase != Phase::Failed {
            return Err(LumenError::validation("there is no failed request to retry", None));
        }
        let Some(params) = self.attempt.lock().await.last_params.clone() else {
            return Err(LumenError::validation("there is no failed request to retry", None));
        };

        if current.retry_count >= self.settings.max_retries {
            let err = LumenError::RetriesExhausted {
                max: self.settings.max_retries,
            };
            warn!(retries = current.retry_count, "retry refused");
            self.state.send_modify(|s| {
                s.phase = Phase::Failed;
                s.progress = 0;
                s.error = Some(StateError::from(&err));
            });
            return Err(err);
        }

        info!(retry = current.retry_count + 1, "retrying generation");
        self.run_attempt(params, current.retry_count + 1).await
    }

    async fn run_attempt(
        &self,
        params: GenerationParams,
        retry_count: u32,
    ) -> Result<GenerationOutcome, LumenError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let timers = self.session.child_token();
        {
            let mut slot = self.attempt.lock().await;
            if let Some(previous) = slot.timers.replace(timers.clone()) {
                previous.cancel();
            }
            slot.last_params = Some(params.clone());
        }

        self.state.send_replace(GenerationState {
            phase: Phase::InFlight,
            progress: 0,
            error: None,
            retry_count,
            attempt: seq,
        });
        debug!(
            attempt = seq,
            mode = %params.source(),
            count = params.count(),
            size = %params.size(),
            "generation started"
        );

        let ticker = timers.child_token();
        self.spawn_ticker(seq, ticker.clone());

        let result = self
            .provider
            .generate(&params)
            .await
            .and_then(require_images);
        ticker.cancel();

        if !self.is_current(seq) {
            debug!(attempt = seq, "discarding result of superseded attempt");
            return Ok(GenerationOutcome::Superseded);
        }

        match result {
            Ok(images) => {
                let applied = self.state.send_if_modified(|s| {
                    if s.attempt != seq {
                        return false;
                    }
                    s.phase = Phase::Success;
                    s.progress = 100;
                    s.error = None;
                    true
                });
                if !applied {
                    debug!(attempt = seq, "discarding result of superseded attempt");
                    return Ok(GenerationOutcome::Superseded);
                }
                info!(attempt = seq, count = images.len(), "generation succeeded");
                self.spawn_success_clear(seq, timers);

                // Only an applied batch reaches the store.
                if let Some(store) = &self.store {
                    if let Err(e) = store.insert_many(images.clone()).await {
                        warn!(error = %e, "generated images could not be saved");
                    }
                }
                Ok(GenerationOutcome::Applied(images))
            }
            Err(err) => {
                warn!(attempt = seq, code = %err.code(), error = %err, "generation failed");
                let applied = self.state.send_if_modified(|s| {
                    if s.attempt != seq {
                        return false;
                    }
                    s.phase = Phase::Failed;
                    s.progress = 0;
                    s.error = Some(StateError::from(&err));
                    true
                });
                if applied {
                    Err(err)
                } else {
                    Ok(GenerationOutcome::Superseded)
                }
            }
        }
    }

    /// Asks the provider for an elaborated prompt after a quiet period.
    ///
    /// A newer call made during the wait (or while the provider is
    /// answering) supersedes this one, which then returns `Ok(None)`.
    pub async fn optimize_prompt(
        &self,
        prompt: &str,
        style: &str,
    ) -> Result<Option<String>, LumenError> {
        validate_optimize(&OptimizeRequest {
            prompt: prompt.to_string(),
            style: style.to_string(),
        })?;

        let token = self.session.child_token();
        if let Some(previous) = self.pending_optimize.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        tokio::select! {
            _ = token.cancelled() => {
                debug!("prompt optimization superseded before sending");
                return Ok(None);
            }
            _ = tokio::time::sleep(self.settings.optimize_debounce) => {}
        }

        let result = self.provider.optimize_prompt(prompt, style).await;
        if token.is_cancelled() {
            debug!("discarding superseded prompt optimization");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Cancels every timer owned by this controller.
    pub fn shutdown(&self) {
        self.session.cancel();
    }

    fn is_current(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq && !self.session.is_cancelled()
    }

    async fn reject(&self, err: LumenError) -> LumenError {
        debug!(error = %err, "request rejected by validation");
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut slot = self.attempt.lock().await;
            if let Some(previous) = slot.timers.take() {
                previous.cancel();
            }
            slot.last_params = None;
        }
        self.state.send_replace(GenerationState {
            phase: Phase::Failed,
            progress: 0,
            error: Some(StateError::from(&err)),
            retry_count: 0,
            attempt: seq,
        });
        err
    }

    fn spawn_ticker(&self, seq: u64, token: CancellationToken) {
        let state = Arc::clone(&self.state);
        let period = self.settings.tick_interval;
        let increment = self.settings.tick_increment;
        let cap = self.settings.progress_cap;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        state.send_if_modified(|s| {
                            if s.attempt != seq || s.phase != Phase::InFlight || s.progress >= cap {
                                return false;
                            }
                            s.progress = s.progress.saturating_add(increment).min(cap);
                            true
                        });
                    }
                }
            }
        });
    }

    fn spawn_success_clear(&self, seq: u64, token: CancellationToken) {
        let state = Arc::clone(&self.state);
        let delay = self.settings.success_display;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    state.send_if_modified(|s| {
                        if s.attempt != seq || s.phase != Phase::Success {
                            return false;
                        }
                        s.phase = Phase::Idle;
                        s.progress = 0;
                        true
                    });
                }
            }
        });
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        self.session.cancel();
    }
}

fn require_images(images: Vec<ImageRecord>) -> Result<Vec<ImageRecord>, LumenError> {
    if images.is_empty() {
        Err(LumenError::api("no valid images returned", 502, None))
    } else {
        Ok(images)
    }
}
