// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen generate`, `lumen edit` and `lumen optimize`.
//!
//! These commands are clients of a running gateway. They drive a
//! [`GenerationController`], render its state as a progress bar and persist
//! results into the local gallery.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use lumen_config::LumenConfig;
use lumen_core::types::GenerateRequest;
use lumen_core::{ErrorKind, ImageProvider, ImageRecord, LumenError};
use lumen_lifecycle::{
    GatewayClient, GenerationController, GenerationOutcome, GenerationState, ImageUpload,
    LifecycleSettings, Phase,
};
use lumen_storage::open_store;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Arguments of `lumen edit`.
#[derive(Debug)]
pub struct EditArgs {
    pub image: PathBuf,
    pub prompt: String,
    pub strength: f64,
    pub size: String,
    pub count: i64,
    pub style: String,
}

async fn build_controller(config: &LumenConfig) -> Result<GenerationController, LumenError> {
    let client = GatewayClient::from_config(config)?;
    debug!(gateway = client.base_url(), "using gateway");
    let store = Arc::new(open_store(&config.storage).await?);
    Ok(GenerationController::new(
        Arc::new(client) as Arc<dyn ImageProvider>,
        LifecycleSettings::from(&config.lifecycle),
    )
    .with_store(store))
}

/// Runs `lumen generate`.
pub async fn run_generate(
    config: &LumenConfig,
    request: GenerateRequest,
    retry: bool,
) -> Result<(), LumenError> {
    let controller = build_controller(config).await?;
    let progress = spawn_progress(controller.subscribe(), new_bar());

    let first = controller.generate_text(&request).await;
    let result = retry_failures(&controller, first, retry).await;

    finish(&controller, progress);
    print_outcome(&result?);
    Ok(())
}

/// Runs `lumen edit`.
pub async fn run_edit(config: &LumenConfig, args: EditArgs, retry: bool) -> Result<(), LumenError> {
    let bytes = tokio::fs::read(&args.image).await.map_err(|e| {
        LumenError::file(
            "could not read the reference image",
            Some(format!("{}: {e}", args.image.display())),
        )
    })?;
    let file_name = args
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let mut upload = ImageUpload::new();
    let preview = upload.select_image(bytes, mime_for_path(&args.image), file_name)?;
    debug!(preview = %preview.display(), "reference image staged");

    let controller = build_controller(config).await?;
    let progress = spawn_progress(controller.subscribe(), new_bar());

    let input = upload.to_input(args.prompt, args.size, args.count, args.style, args.strength);
    let first = controller.generate_from_image(input).await;
    let result = retry_failures(&controller, first, retry).await;

    finish(&controller, progress);
    upload.remove_image();
    print_outcome(&result?);
    Ok(())
}

/// Runs `lumen optimize`.
pub async fn run_optimize(config: &LumenConfig, prompt: &str, style: &str) -> Result<(), LumenError> {
    let client = GatewayClient::from_config(config)?;
    let controller = GenerationController::new(
        Arc::new(client) as Arc<dyn ImageProvider>,
        LifecycleSettings::from(&config.lifecycle),
    );
    let optimized = controller.optimize_prompt(prompt, style).await?;
    controller.shutdown();

    match optimized {
        Some(text) => println!("{text}"),
        None => eprintln!("optimization was superseded"),
    }
    Ok(())
}

/// With `retry`, re-runs failed attempts while the failure is one a retry
/// can fix and the controller still allows it.
async fn retry_failures(
    controller: &GenerationController,
    mut result: Result<GenerationOutcome, LumenError>,
    retry: bool,
) -> Result<GenerationOutcome, LumenError> {
    if !retry {
        return result;
    }
    loop {
        match &result {
            Err(e) if is_retryable(e) => {
                eprintln!("attempt failed: {}; retrying", e.user_message());
                result = controller.retry().await;
            }
            _ => return result,
        }
    }
}

fn is_retryable(err: &LumenError) -> bool {
    !matches!(err, LumenError::RetriesExhausted { .. })
        && matches!(err.kind(), ErrorKind::Api | ErrorKind::Network)
}

fn new_bar() -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Mirrors controller state onto `bar` until aborted.
fn spawn_progress(mut rx: watch::Receiver<GenerationState>, bar: ProgressBar) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let state = rx.borrow_and_update().clone();
            bar.set_position(u64::from(state.progress));
            bar.set_message(progress_message(&state));
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

fn progress_message(state: &GenerationState) -> String {
    match state.phase {
        Phase::Idle => String::new(),
        Phase::InFlight if state.retry_count > 0 => {
            format!("generating (retry {})", state.retry_count)
        }
        Phase::InFlight => "generating".to_string(),
        Phase::Success => "done".to_string(),
        Phase::Failed => match &state.error {
            Some(err) => format!("failed: {}", err.message),
            None => "failed".to_string(),
        },
    }
}

fn finish(controller: &GenerationController, progress: JoinHandle<()>) {
    progress.abort();
    controller.shutdown();
}

fn print_outcome(outcome: &GenerationOutcome) {
    let images = outcome.images();
    println!("{}", summary_line(images));
    for image in images {
        println!("  {}  {}", image.id, image.url);
    }
}

fn summary_line(images: &[ImageRecord]) -> String {
    match images.len() {
        0 => "no images generated".to_string(),
        1 => "1 image saved to the gallery".to_string(),
        n => format!("{n} images saved to the gallery"),
    }
}

/// Content type guessed from the file extension.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
