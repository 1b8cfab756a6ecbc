// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of upstream results into canonical image records, plus the
//! development-only placeholder generator.

use lumen_core::{GenerationParams, ImageRecord};

use crate::types::ImageDatum;

/// Fresh record id: `{prefix}{unix_millis}_{index}_{8 hex}`.
///
/// The random suffix keeps ids unique across batches issued within the same
/// millisecond.
pub fn record_id(prefix: &str, millis: i64, index: usize) -> String {
    format!("{prefix}{millis}_{index}_{:08x}", rand::random::<u32>())
}

fn id_prefix(params: &GenerationParams) -> &'static str {
    match params {
        GenerationParams::TextToImage { .. } => "",
        GenerationParams::ImageToImage { .. } => "img2img_",
    }
}

fn build_record(params: &GenerationParams, id: String, url: String) -> ImageRecord {
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
        } => ImageRecord::image_to_image(id, url, prompt.clone(), *size, style.clone(), *strength),
    }
}

/// Converts upstream data entries into records, skipping entries with no
/// usable image.
///
/// Records keep the user's prompt, not the style-augmented one.
pub fn normalize(params: &GenerationParams, data: &[ImageDatum]) -> Vec<ImageRecord> {
    let millis = chrono::Utc::now().timestamp_millis();
    let prefix = id_prefix(params);
    data.iter()
        .filter_map(ImageDatum::location)
        .enumerate()
        .map(|(index, url)| build_record(params, record_id(prefix, millis, index), url))
        .collect()
}

/// Synthesizes `count` placeholder records from a seeded placeholder service.
pub fn placeholders(params: &GenerationParams, base_url: &str) -> Vec<ImageRecord> {
    let millis = chrono::Utc::now().timestamp_millis();
    let prefix = format!("demo_{}", id_prefix(params));
    let size = params.size();
    let base = base_url.trim_end_matches('/');
    (0..usize::from(params.count()))
        .map(|index| {
            let seed = millis + index as i64;
            let url = format!("{base}/{}/{}?random={seed}", size.width(), size.height());
            build_record(params, record_id(&prefix, millis, index), url)
        })
        .collect()
}
