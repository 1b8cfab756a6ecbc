// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen gallery ...` and `lumen styles`.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use lumen_config::LumenConfig;
use lumen_core::{LumenError, STYLES, StoredImage};
use lumen_lifecycle::install_signal_handler;
use lumen_storage::{GalleryPage, GalleryView, ImageStore, open_store, spawn_gallery_sync};
use tokio::sync::Mutex;

const PROMPT_WIDTH: usize = 48;

async fn open_view(config: &LumenConfig) -> Result<(Arc<ImageStore>, GalleryView), LumenError> {
    let store = Arc::new(open_store(&config.storage).await?);
    let mut view = GalleryView::new(store.clone(), config.gallery.page_size);
    view.refresh().await;
    Ok((store, view))
}

/// Runs `lumen gallery list`.
pub async fn run_list(
    config: &LumenConfig,
    search: Option<&str>,
    page: usize,
    json: bool,
) -> Result<(), LumenError> {
    let (_store, mut view) = open_view(config).await?;
    view.set_search(search.unwrap_or_default());
    for _ in 1..page {
        if !view.load_more() {
            break;
        }
    }
    let page = view.page();

    if json {
        let rendered = serde_json::to_string_pretty(&page)
            .map_err(|e| LumenError::Internal(format!("failed to render gallery: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    let use_color = std::io::stdout().is_terminal();
    for image in &page.items {
        println!("{}", format_row(image, use_color));
    }
    println!("{}", footer(&page, view.search_term()));
    Ok(())
}

/// Runs `lumen gallery favorite`.
pub async fn run_favorite(config: &LumenConfig, id: &str) -> Result<(), LumenError> {
    let store = open_store(&config.storage).await?;
    if store.get(id).await.is_none() {
        return Err(LumenError::validation(
            "no stored image has that id",
            Some(id.to_string()),
        ));
    }
    if store.toggle_favorite(id).await? {
        println!("{id} is now a favorite");
    } else {
        println!("{id} is no longer a favorite");
    }
    Ok(())
}

/// Runs `lumen gallery delete`.
pub async fn run_delete(config: &LumenConfig, id: &str) -> Result<(), LumenError> {
    let (_store, mut view) = open_view(config).await?;
    if view.delete(id).await? {
        println!("deleted {id}");
        Ok(())
    } else {
        Err(LumenError::validation(
            "no stored image has that id",
            Some(id.to_string()),
        ))
    }
}

/// Runs `lumen gallery stats`.
pub async fn run_stats(config: &LumenConfig, json: bool) -> Result<(), LumenError> {
    let store = open_store(&config.storage).await?;
    let stats = store.stats().await;
    if json {
        let rendered = serde_json::to_string_pretty(&stats)
            .map_err(|e| LumenError::Internal(format!("failed to render stats: {e}")))?;
        println!("{rendered}");
    } else {
        println!("  images:    {} (max {})", stats.total_images, store.max_images());
        println!("  favorites: {}", stats.favorite_images);
        println!("  storage:   {}", format_bytes(stats.storage_used_bytes));
        println!("  database:  {}", config.storage.database_path);
    }
    Ok(())
}

/// Runs `lumen gallery clear`.
pub async fn run_clear(config: &LumenConfig, yes: bool) -> Result<(), LumenError> {
    if !yes {
        return Err(LumenError::validation(
            "refusing to clear the gallery without --yes",
            None,
        ));
    }
    let store = open_store(&config.storage).await?;
    let removed = store.stats().await.total_images;
    store.clear().await?;
    println!("removed {removed} images");
    Ok(())
}

/// Runs `lumen gallery watch`: reprints the summary whenever the gallery
/// changes, re-reading the database on the configured interval so writes
/// from other processes show up.
pub async fn run_watch(config: &LumenConfig, search: Option<&str>) -> Result<(), LumenError> {
    let (store, mut view) = open_view(config).await?;
    view.set_search(search.unwrap_or_default());
    let view = Arc::new(Mutex::new(view));

    let shutdown = install_signal_handler();
    let interval = Duration::from_secs(config.gallery.refresh_interval_secs);
    let sync = spawn_gallery_sync(view.clone(), &store, Some(interval), shutdown.child_token());

    let use_color = std::io::stdout().is_terminal();
    let mut last: Option<Vec<(String, bool)>> = None;
    let mut poll = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = poll.tick() => {
                let page = view.lock().await.page();
                let signature: Vec<(String, bool)> = page
                    .items
                    .iter()
                    .map(|i| (i.record.id.clone(), i.is_favorite))
                    .collect();
                if last.as_ref() != Some(&signature) {
                    let term = view.lock().await.search_term().to_string();
                    for image in &page.items {
                        println!("{}", format_row(image, use_color));
                    }
                    println!("{}", footer(&page, &term));
                    last = Some(signature);
                }
            }
        }
    }

    if let Err(e) = sync.await {
        tracing::warn!(error = %e, "gallery sync task failed");
    }
    Ok(())
}

/// Prints the style table.
pub fn print_styles() {
    for style in STYLES {
        println!("  {:<14} {:<14} {}", style.key, style.label, style.description);
    }
}

fn format_row(image: &StoredImage, use_color: bool) -> String {
    let star = match (image.is_favorite, use_color) {
        (true, true) => {
            use colored::Colorize;
            "★".yellow().to_string()
        }
        (true, false) => "*".to_string(),
        (false, _) => " ".to_string(),
    };
    let record = &image.record;
    format!(
        "{star} {:<28} {:<10} {:<13} {:<14} {}",
        record.id,
        record.size.to_string(),
        record.style,
        record.source.to_string(),
        truncate(&record.prompt, PROMPT_WIDTH)
    )
}

fn footer(page: &GalleryPage, search: &str) -> String {
    let mut line = if search.trim().is_empty() {
        format!("showing {} of {} images", page.items.len(), page.total)
    } else {
        format!(
            "showing {} of {} images matching '{}' ({} stored)",
            page.items.len(),
            page.matching,
            search.trim(),
            page.total
        )
    };
    line.push_str(&format!(", {} favorites", page.favorites));
    if page.has_more {
        line.push_str(&format!("; more with --page {}", page.page + 1));
    }
    line
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}
