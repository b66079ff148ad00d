//! Anthropic messages front end for flat-prompt completion backends
//!
//! A structured messages request is flattened into one tagged prompt
//! ([`compose`]), completed by a [`Backend`], and replayed to the client as
//! an Anthropic event stream ([`emitter`]), with tool calls recovered from
//! inline markup in the answer ([`extract`]).

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod compose;
pub mod emitter;
pub mod error;
pub mod extract;
mod handler;
pub mod protocol;
pub mod service;

pub use backend::Backend;
pub use backend::openai::OpenAiBackend;
pub use compose::{ComposedPrompt, PromptComposer};
pub use emitter::{EventStreamEmitter, Frame, FrameSink};
pub use error::{AdapterError, BackendError};
pub use extract::{ToolInvocation, extract};
pub use handler::adapter_router;
pub use service::{AdapterService, PreparedTurn, TurnOutcome};
