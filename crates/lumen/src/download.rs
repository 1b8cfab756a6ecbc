// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen gallery download`: saves a stored image to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use lumen_config::LumenConfig;
use lumen_core::{ImageRecord, LumenError};
use lumen_storage::open_store;
use tracing::debug;

/// Runs `lumen gallery download`.
pub async fn run_download(
    config: &LumenConfig,
    id: &str,
    out: Option<&Path>,
) -> Result<(), LumenError> {
    let store = open_store(&config.storage).await?;
    let Some(image) = store.get(id).await else {
        return Err(LumenError::validation(
            "no stored image has that id",
            Some(id.to_string()),
        ));
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.provider.timeout_secs))
        .build()
        .map_err(|e| LumenError::Internal(format!("failed to build HTTP client: {e}")))?;
    let dir = out.unwrap_or_else(|| Path::new("."));
    let path = download_image(&client, &image.record, dir).await?;
    println!("saved {}", path.display());
    Ok(())
}

/// Fetches the image behind `image.url` and writes it into `dir`.
pub async fn download_image(
    client: &reqwest::Client,
    image: &ImageRecord,
    dir: &Path,
) -> Result<PathBuf, LumenError> {
    let bytes = fetch_image(client, &image.url).await?;

    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        LumenError::file(
            "could not create the download directory",
            Some(format!("{}: {e}", dir.display())),
        )
    })?;
    let dest = dir.join(download_file_name(&image.timestamp));
    tokio::fs::write(&dest, &bytes).await.map_err(|e| {
        LumenError::file(
            "could not save the image",
            Some(format!("{}: {e}", dest.display())),
        )
    })?;

    debug!(id = %image.id, path = %dest.display(), bytes = bytes.len(), "image downloaded");
    Ok(dest)
}

async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, LumenError> {
    if let Some(inline) = url.strip_prefix("data:") {
        return decode_data_url(inline);
    }

    let response = client.get(url).send().await.map_err(|e| {
        LumenError::network("could not download the image", Some(format!("{url}: {e}")))
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(LumenError::api(
            "image download failed",
            502,
            Some(format!("{url} answered {status}")),
        ));
    }

    let bytes = response.bytes().await.map_err(|e| {
        LumenError::network("could not download the image", Some(format!("{url}: {e}")))
    })?;
    Ok(bytes.to_vec())
}

/// Decodes the part of a `data:` URL after the scheme.
fn decode_data_url(inline: &str) -> Result<Vec<u8>, LumenError> {
    let Some((meta, payload)) = inline.split_once(',') else {
        return Err(LumenError::file("the stored image data is malformed", None));
    };
    if !meta.ends_with(";base64") {
        return Err(LumenError::file(
            "the stored image data is not base64 encoded",
            Some(meta.to_string()),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| LumenError::file("the stored image data is malformed", Some(e.to_string())))
}

/// `ai-image-<UTC timestamp to the second>.png`, with `:` replaced by `-`.
fn download_file_name(timestamp: &str) -> String {
    let when = DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    format!("ai-image-{}.png", when.format("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{ErrorKind, ImageSize};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn record(url: impl Into<String>) -> ImageRecord {
        let mut record = ImageRecord::text_to_image(
            "img_1",
            url,
            "a lighthouse",
            ImageSize::Square1024,
            "watercolor",
        );
        record.timestamp = "2024-03-05T14:07:09.123Z".to_string();
        record
    }

    #[test]
    fn file_name_uses_record_timestamp() {
        assert_eq!(
            download_file_name("2024-03-05T14:07:09.123Z"),
            "ai-image-2024-03-05T14-07-09.png"
        );
        assert_eq!(
            download_file_name("2024-03-05T16:07:09+02:00"),
            "ai-image-2024-03-05T14-07-09.png"
        );
    }

    #[test]
    fn unparseable_timestamp_still_names_the_file() {
        let name = download_file_name("yesterday");
        assert!(name.starts_with("ai-image-"));
        assert!(name.ends_with(".png"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn data_urls_decode() {
        assert_eq!(decode_data_url("image/png;base64,iVBORw0KGgo=").unwrap(), PNG);
        assert_eq!(
            decode_data_url("image/png,rawbytes").unwrap_err().kind(),
            ErrorKind::File
        );
        assert_eq!(
            decode_data_url("image/png;base64,@@@").unwrap_err().kind(),
            ErrorKind::File
        );
    }

    #[tokio::test]
    async fn downloads_remote_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images/img_1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("downloads");
        let saved = download_image(
            &reqwest::Client::new(),
            &record(format!("{}/images/img_1.png", server.uri())),
            &out,
        )
        .await
        .unwrap();

        assert_eq!(saved, out.join("ai-image-2024-03-05T14-07-09.png"));
        assert_eq!(std::fs::read(&saved).unwrap(), PNG);
    }

    #[tokio::test]
    async fn failed_download_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = download_image(
            &reqwest::Client::new(),
            &record(format!("{}/gone.png", server.uri())),
            dir.path(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), 502);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn inline_image_is_written_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let saved = download_image(
            &reqwest::Client::new(),
            &record("data:image/png;base64,iVBORw0KGgo="),
            dir.path(),
        )
        .await
        .unwrap();
        assert_eq!(std::fs::read(saved).unwrap(), PNG);
    }

    #[tokio::test]
    async fn download_of_unknown_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LumenConfig::default();
        config.storage.database_path = dir.path().join("lumen.db").to_string_lossy().into_owned();

        let err = run_download(&config, "missing", Some(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn download_command_saves_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LumenConfig::default();
        config.storage.database_path = dir.path().join("lumen.db").to_string_lossy().into_owned();
        open_store(&config.storage)
            .await
            .unwrap()
            .insert_many(vec![record("data:image/png;base64,iVBORw0KGgo=")])
            .await
            .unwrap();

        let out = dir.path().join("out");
        run_download(&config, "img_1", Some(&out)).await.unwrap();
        assert_eq!(
            std::fs::read(out.join("ai-image-2024-03-05T14-07-09.png")).unwrap(),
            PNG
        );
    }
}
