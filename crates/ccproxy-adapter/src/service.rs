//! One adapted turn: compose, complete, replay

use std::sync::Arc;

use ccproxy_config::Config;
use tokio_util::sync::CancellationToken;

use crate::backend::Backend;
use crate::backend::openai::OpenAiBackend;
use crate::compose::{ComposedPrompt, PromptComposer};
use crate::emitter::{EventStreamEmitter, FrameSink};
use crate::error::AdapterError;
use crate::extract::extract;
use crate::protocol::anthropic::ChatRequest;

/// A request that passed validation and is ready to be streamed
#[derive(Debug, Clone)]
pub struct PreparedTurn {
    model: String,
    backend_model: String,
    prompt: ComposedPrompt,
}

impl PreparedTurn {
    /// Model echoed back to the client
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model the backend is asked to run
    pub fn backend_model(&self) -> &str {
        &self.backend_model
    }

    pub const fn prompt(&self) -> &ComposedPrompt {
        &self.prompt
    }
}

/// How a streamed turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Terminator written after `tool_calls` tool groups
    Completed { tool_calls: usize },
    /// The peer went away before the backend finished
    Cancelled,
}

/// Orchestrates prompt composition, the backend call and event emission
pub struct AdapterService {
    composer: PromptComposer,
    backend: Arc<dyn Backend>,
    model_override: Option<String>,
}

impl AdapterService {
    pub fn new(composer: PromptComposer, backend: Arc<dyn Backend>, model_override: Option<String>) -> Self {
        Self {
            composer,
            backend,
            model_override,
        }
    }

    /// Build the service with the OpenAI-compatible backend from config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PromptComposer::new(config.adapter.clone()),
            Arc::new(OpenAiBackend::new(&config.backend)),
            config.backend.model.clone(),
        )
    }

    /// Validate and compose a request
    ///
    /// Nothing is sent to the peer or the backend here, so a rejection can
    /// still be reported with a plain status code.
    pub fn prepare(&self, request: &ChatRequest) -> Result<PreparedTurn, AdapterError> {
        tracing::info!(model = %request.model, messages = request.messages.len(), "received messages request");

        let prompt = self.composer.compose(request).inspect_err(|e| {
            tracing::warn!(model = %request.model, error = %e, "rejected messages request");
        })?;

        tracing::info!(conversation = %prompt.conversation(), "composed prompt");

        Ok(PreparedTurn {
            model: request.model.clone(),
            backend_model: self.model_override.clone().unwrap_or_else(|| request.model.clone()),
            prompt,
        })
    }

    /// Stream one turn into `sink`
    ///
    /// Text fragments are forwarded as they arrive. Once the backend
    /// finishes, the text block is closed, tool invocations found in the
    /// answer are replayed as tool-use groups, and the terminator is
    /// sent. A backend that streamed nothing gets its whole answer replayed
    /// as one delta. When the backend fails the stream is left open-ended
    /// and the error is returned. Cancelling `cancel` drops the in-flight
    /// backend call.
    pub async fn run<S: FrameSink + Send>(
        &self,
        turn: PreparedTurn,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, AdapterError> {
        let mut emitter = EventStreamEmitter::new(sink, turn.model);
        emitter.start()?;

        let mut streamed = false;
        let mut send_error = None;
        let mut on_fragment = |fragment: &str| {
            if send_error.is_some() {
                return;
            }
            streamed = true;
            if let Err(e) = emitter.text_delta(fragment) {
                // peer is gone, stop the backend as well
                cancel.cancel();
                send_error = Some(e);
            }
        };

        let call = self.backend.complete(&turn.backend_model, turn.prompt.as_str(), &mut on_fragment);
        let completion = tokio::select! {
            result = call => Some(result),
            () = cancel.cancelled() => None,
        };

        if let Some(e) = send_error {
            return Err(e);
        }
        let Some(completion) = completion else {
            return Ok(TurnOutcome::Cancelled);
        };
        let answer = completion?;

        tracing::debug!(backend = self.backend.name(), answer = %answer, "backend answer");

        if !streamed && !answer.is_empty() {
            emitter.text_delta(&answer)?;
        }
        emitter.finish_text_block()?;

        let invocations = extract(&answer);
        for invocation in &invocations {
            let call_id = emitter.tool_block(invocation)?;
            tracing::info!(tool = %invocation.name, call_id = %call_id, "emitted tool invocation");
        }

        emitter.terminate()?;

        Ok(TurnOutcome::Completed {
            tool_calls: invocations.len(),
        })
    }
}
