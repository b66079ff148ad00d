//! Mock completion backend for integration tests
//!
//! Serves a minimal OpenAI-compatible streaming `/chat/completions` that
//! replays scripted text fragments and records what it was asked.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub authorization: Option<String>,
}

/// Mock backend that streams predictable answers
pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    fragments: Vec<String>,
    fail: bool,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockBackend {
    /// Start a mock that streams `fragments` in order
    pub async fn start(fragments: &[&str]) -> anyhow::Result<Self> {
        Self::start_inner(fragments, false).await
    }

    /// Start a mock that answers every request with a 500
    pub async fn start_failing() -> anyhow::Result<Self> {
        Self::start_inner(&[], true).await
    }

    async fn start_inner(fragments: &[&str], fail: bool) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            fragments: fragments.iter().map(|f| (*f).to_owned()).collect(),
            fail,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Endpoint root for the backend config
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("lock poisoned").clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(default)]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[allow(dead_code)]
    role: String,
    content: String,
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(req): Json<ChatCompletionRequest>,
) -> Response {
    state.requests.lock().expect("lock poisoned").push(RecordedRequest {
        model: req.model.clone(),
        prompt: req.messages.iter().map(|m| m.content.as_str()).collect(),
        stream: req.stream,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    });

    if state.fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": {
                    "message": "mock server intentional failure",
                    "type": "server_error"
                }
            })),
        )
            .into_response();
    }

    let mut body = String::new();
    let role_chunk = chunk(&req.model, serde_json::json!({"role": "assistant"}), None);
    body.push_str(&format!("data: {role_chunk}\n\n"));
    for fragment in &state.fragments {
        let content_chunk = chunk(&req.model, serde_json::json!({"content": fragment}), None);
        body.push_str(&format!("data: {content_chunk}\n\n"));
    }
    let stop_chunk = chunk(&req.model, serde_json::json!({}), Some("stop"));
    body.push_str(&format!("data: {stop_chunk}\n\n"));
    body.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn chunk(model: &str, delta: serde_json::Value, finish_reason: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000u64,
        "model": model,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}
