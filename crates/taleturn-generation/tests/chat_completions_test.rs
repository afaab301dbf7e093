//! Integration tests for `ChatCompletionsBackend` against a local stub server.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use taleturn_core::action::ActionId;
use taleturn_core::backend::{GenerationBackend, GenerationRequest};
use taleturn_core::error::GenerationError;
use taleturn_generation::{ChatCompletionsBackend, ChatCompletionsConfig};
use taleturn_test_support::RecordingProgressSink;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Serves `router` on an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn backend_for(base_url: String) -> ChatCompletionsBackend {
    ChatCompletionsBackend::new(ChatCompletionsConfig {
        base_url,
        request_timeout: Duration::from_secs(10),
        ..ChatCompletionsConfig::default()
    })
    .unwrap()
}

fn first_turn() -> GenerationRequest {
    GenerationRequest {
        turn_id: Uuid::new_v4(),
        log: Vec::new(),
        action: None,
    }
}

fn sse_chunk(content: &str) -> String {
    let chunk = serde_json::json!({ "choices": [{ "delta": { "content": content }, "index": 0 }] });
    format!("data: {chunk}\n\n")
}

async fn streamed_turn() -> impl IntoResponse {
    let mut body = String::from("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"index\":0}]}\n\n");
    for part in [
        "{\"narration\": [\"You wake ",
        "in a cellar.\"], ",
        "\"actions\": [\"flee\", \"fight\"]}",
    ] {
        body.push_str(&sse_chunk(part));
    }
    body.push_str("data: [DONE]\n\n");
    ([(header::CONTENT_TYPE, "text/event-stream")], body)
}

#[tokio::test]
async fn test_streamed_reply_becomes_generation_with_progress() {
    // Arrange
    let base_url = serve(Router::new().route("/v1/chat/completions", post(streamed_turn))).await;
    let backend = backend_for(base_url);
    let sink = RecordingProgressSink::new();

    // Act
    let generation = backend
        .generate(first_turn(), &sink, &CancellationToken::new())
        .await
        .unwrap();

    // Assert
    assert_eq!(generation.narration.len(), 1);
    assert_eq!(generation.narration[0]["text"], "You wake in a cellar.");
    assert_eq!(generation.actions, [ActionId::from("flee"), ActionId::from("fight")]);
    assert_eq!(sink.token_counts(), [0, 1, 2, 3]);
    assert_eq!(sink.reports()[0].title, "Waiting for model");
}

#[tokio::test]
async fn test_http_error_surfaces_server_message() {
    // Arrange
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                r#"{"error":{"message":"model is loading"}}"#,
            )
        }),
    );
    let backend = backend_for(serve(router).await);
    let sink = RecordingProgressSink::new();

    // Act
    let result = backend
        .generate(first_turn(), &sink, &CancellationToken::new())
        .await;

    // Assert
    match result {
        Err(GenerationError::Transport(message)) => {
            assert!(message.contains("503"));
            assert!(message.contains("model is loading"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_settles_a_hanging_request() {
    // Arrange
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { std::future::pending::<String>().await }),
    );
    let backend = backend_for(serve(router).await);
    let sink = RecordingProgressSink::new();
    let cancel = CancellationToken::new();

    // Act
    let (result, ()) = tokio::join!(backend.generate(first_turn(), &sink, &cancel), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    // Assert
    assert_eq!(result, Err(GenerationError::Cancelled));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    // Arrange: bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = backend_for(format!("http://{addr}"));
    let sink = RecordingProgressSink::new();

    // Act
    let result = backend
        .generate(first_turn(), &sink, &CancellationToken::new())
        .await;

    // Assert
    assert!(matches!(result, Err(GenerationError::Transport(_))));
}
