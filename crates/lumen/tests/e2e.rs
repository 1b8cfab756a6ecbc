// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a real gateway on a loopback port in front of the mock
//! provider, driven by the same client stack the CLI uses.

use std::sync::Arc;
use std::time::Duration;

use lumen_core::types::GenerateRequest;
use lumen_core::{ErrorKind, ImageProvider, ImageSource, LumenError};
use lumen_gateway::GatewayState;
use lumen_lifecycle::{GatewayClient, GenerationController, ImageUpload, Phase};
use lumen_storage::memory_store;
use lumen_test_utils::{MockImageProvider, MockOutcome, TestHarness};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Running {
    provider: Arc<MockImageProvider>,
    client: Arc<GatewayClient>,
    shutdown: CancellationToken,
    server: JoinHandle<Result<(), LumenError>>,
}

async fn start_gateway() -> Running {
    let provider = Arc::new(MockImageProvider::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let state = GatewayState::new(provider.clone() as Arc<dyn ImageProvider>);
    let server = tokio::spawn(lumen_gateway::serve(listener, state, shutdown.clone()));

    let client =
        Arc::new(GatewayClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap());
    Running {
        provider,
        client,
        shutdown,
        server,
    }
}

fn controller_for(running: &Running) -> (GenerationController, Arc<lumen_storage::ImageStore>) {
    let store = Arc::new(memory_store(100));
    let controller = GenerationController::new(
        running.client.clone() as Arc<dyn ImageProvider>,
        TestHarness::fast_settings(),
    )
    .with_store(store.clone());
    (controller, store)
}

fn request(count: i64) -> GenerateRequest {
    GenerateRequest {
        prompt: "a lighthouse at dusk".into(),
        size: "1024x1024".into(),
        count,
        style: "watercolor".into(),
    }
}

#[tokio::test]
async fn generate_through_gateway_persists_locally() {
    let running = start_gateway().await;
    let (controller, store) = controller_for(&running);

    let outcome = controller.generate_text(&request(3)).await.unwrap();
    assert_eq!(outcome.images().len(), 3);
    assert_eq!(controller.state().phase, Phase::Success);
    assert_eq!(running.provider.generate_calls(), 1);

    let stored = store.list_all().await;
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|i| i.record.prompt == "a lighthouse at dusk"));

    running.shutdown.cancel();
    running.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn gateway_errors_keep_their_kind_on_the_client() {
    let running = start_gateway().await;
    running
        .provider
        .push(MockOutcome::Fail(LumenError::api("image service unavailable", 503, None)))
        .await;
    running
        .provider
        .push(MockOutcome::Fail(LumenError::auth("API key is not configured", None)))
        .await;
    let (controller, store) = controller_for(&running);

    let err = controller.generate_text(&request(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status_code(), 503);
    assert_eq!(err.user_message(), "image service unavailable");

    let err = controller.retry().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    let state = controller.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.retry_count, 1);
    assert!(store.list_all().await.is_empty());

    let outcome = controller.retry().await.unwrap();
    assert_eq!(outcome.images().len(), 1);
    assert_eq!(store.list_all().await.len(), 1);
}

#[tokio::test]
async fn image_to_image_over_multipart() {
    let running = start_gateway().await;
    let (controller, store) = controller_for(&running);

    let mut upload = ImageUpload::new();
    upload
        .select_image(vec![0x89, b'P', b'N', b'G', 1, 2, 3], "image/png", Some("ref.png".into()))
        .unwrap();

    let outcome = controller
        .generate_from_image(upload.to_input("make it snowy", "1024x1024", 2, "fantasy", 0.4))
        .await
        .unwrap();
    assert_eq!(outcome.images().len(), 2);

    let stored = store.list_all().await;
    assert!(stored.iter().all(|i| i.record.source == ImageSource::ImageToImage));
    assert!(stored.iter().all(|i| i.record.strength == Some(0.4)));
}

#[tokio::test]
async fn optimize_through_gateway() {
    let running = start_gateway().await;
    running
        .provider
        .push(MockOutcome::Text("a lighthouse at dusk, soft watercolor washes".into()))
        .await;
    let (controller, _store) = controller_for(&running);

    let optimized = controller
        .optimize_prompt("a lighthouse at dusk", "watercolor")
        .await
        .unwrap();
    assert_eq!(
        optimized.as_deref(),
        Some("a lighthouse at dusk, soft watercolor washes")
    );
    assert_eq!(running.provider.optimize_calls(), 1);
}

#[tokio::test]
async fn health_and_graceful_shutdown() {
    let running = start_gateway().await;

    let health = running.client.health().await.unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["provider"], "healthy");

    running.shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), running.server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let err = running.client.health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
