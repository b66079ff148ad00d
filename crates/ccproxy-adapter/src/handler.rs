//! Axum route for the Anthropic-compatible messages endpoint

use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing};
use bytes::Bytes;
use ccproxy_core::HttpError;
use futures_util::{FutureExt, Stream};
use http::header;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::emitter::{DONE_MARKER, Frame, FrameSink};
use crate::error::AdapterError;
use crate::protocol::anthropic::ChatRequest;
use crate::service::{AdapterService, PreparedTurn, TurnOutcome};

type SseItem = Result<Event, io::Error>;

/// Build the adapter router
///
/// Conversations grow with every turn, so request bodies are not capped.
pub fn adapter_router(service: Arc<AdapterService>) -> Router {
    Router::new()
        .route("/v1/messages", routing::post(messages))
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

/// Handle `POST /v1/messages`
///
/// Parsing and composition happen before any byte is streamed, so
/// rejections get a plain-text body with a 4xx status. Everything after
/// that runs in a per-request task feeding the SSE response.
async fn messages(State(service): State<Arc<AdapterService>>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "malformed messages request");
            return error_response(&AdapterError::InvalidRequest(e.to_string()));
        }
    };

    let turn = match service.prepare(&request) {
        Ok(turn) => turn,
        Err(e) => return error_response(&e),
    };

    let (sender, receiver) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    tokio::spawn(run_session(service, turn, sender, cancel.clone()));

    let events = event_stream(receiver, cancel.drop_guard());

    (
        [(header::CONNECTION, "keep-alive")],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

/// Drive one streamed turn and report how it ended
async fn run_session(
    service: Arc<AdapterService>,
    turn: PreparedTurn,
    sender: UnboundedSender<SseItem>,
    cancel: CancellationToken,
) {
    let sink = ChannelSink {
        sender: sender.clone(),
    };
    let session = AssertUnwindSafe(service.run(turn, sink, cancel)).catch_unwind().await;

    let failure = match session {
        Ok(Ok(TurnOutcome::Completed { tool_calls })) => {
            tracing::debug!(tool_calls, "turn completed");
            return;
        }
        Ok(Ok(TurnOutcome::Cancelled)) => {
            tracing::info!("peer disconnected, backend call dropped");
            return;
        }
        Ok(Err(AdapterError::Transport(e))) => {
            tracing::warn!(error = %e, "event stream send failed, aborting turn");
            return;
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, error_type = e.error_type(), "turn failed after stream opened");
            e.client_message()
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(panic = %message, "turn panicked");
            message
        }
    };

    // an error item makes the server abort the response without a terminator
    let _ = sender.send(Err(io::Error::other(failure)));
}

/// Turn the session channel into the SSE body stream
///
/// The stream owns `disconnect`, so dropping the response cancels the turn.
fn event_stream(receiver: UnboundedReceiver<SseItem>, disconnect: DropGuard) -> impl Stream<Item = SseItem> {
    futures_util::stream::unfold((receiver, disconnect), |(mut receiver, disconnect)| async move {
        let item = receiver.recv().await?;
        Some((item, (receiver, disconnect)))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// Convert an adapter error to a plain-text response
fn error_response(error: &AdapterError) -> Response {
    (error.status_code(), error.client_message()).into_response()
}

/// Frame sink feeding the SSE response of one request
struct ChannelSink {
    sender: UnboundedSender<SseItem>,
}

impl FrameSink for ChannelSink {
    fn send(&mut self, frame: Frame) -> io::Result<()> {
        let event = match frame {
            Frame::Event { name, data } => Event::default().event(name).data(data),
            Frame::Done => Event::default().data(DONE_MARKER),
        };
        self.sender
            .send(Ok(event))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer disconnected"))
    }
}
