//! Replays a completed answer as a framed Anthropic event stream
//!
//! The sequence for one turn is:
//!
//! ```text
//! message_start, content_block_start(0, text), ping,
//! content_block_delta(0)*, content_block_stop(0), message_stop,
//! ( content_block_start(i, tool_use), content_block_delta(i),
//!   content_block_stop(i), message_delta(tool_use), message_stop )*,
//! data: [DONE]
//! ```
//!
//! Each tool block group closes its own synthetic message, and block
//! indices keep increasing across groups within a stream.

use std::fmt;
use std::io;

use rand::Rng;
use serde_json::Value;

use crate::error::AdapterError;
use crate::extract::ToolInvocation;
use crate::protocol::anthropic::{
    MessageDeltaBody, StopReason, StreamContentBlock, StreamDelta, StreamEvent, StreamMessage, Usage,
};

/// Payload of the unnamed event closing the transmission
pub const DONE_MARKER: &str = "[DONE]";

/// Length of generated message and call identifiers, excluding the prefix
pub const ID_LENGTH: usize = 24;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// Placeholder counters reported on tool-use message deltas
const PLACEHOLDER_INPUT_TOKENS: u32 = 89;
const PLACEHOLDER_OUTPUT_TOKENS: u32 = 11;
const PLACEHOLDER_CACHE_READ_TOKENS: u32 = 11_392;

/// One server-sent event produced by the emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Named event with a JSON payload whose `type` equals `name`
    Event { name: &'static str, data: String },
    /// Unnamed `data: [DONE]` terminator
    Done,
}

impl Frame {
    /// Event name, `None` for the terminator
    pub const fn name(&self) -> Option<&'static str> {
        match self {
            Self::Event { name, .. } => Some(*name),
            Self::Done => None,
        }
    }

    /// Raw `data:` payload
    pub fn data(&self) -> &str {
        match self {
            Self::Event { data, .. } => data,
            Self::Done => DONE_MARKER,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event { name, data } => write!(f, "event: {name}\ndata: {data}\n\n"),
            Self::Done => write!(f, "data: {DONE_MARKER}\n\n"),
        }
    }
}

/// Destination of emitted frames
///
/// A frame is delivered once `send` returns. An error means the peer is
/// gone and nothing more can be delivered.
pub trait FrameSink {
    fn send(&mut self, frame: Frame) -> io::Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn send(&mut self, frame: Frame) -> io::Result<()> {
        self.push(frame);
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn send(&mut self, frame: Frame) -> io::Result<()> {
        (**self).send(frame)
    }
}

/// Random lowercase alphanumeric identifier of [`ID_LENGTH`] characters
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing written yet
    Idle,
    /// Text block 0 is open and accepts deltas
    TextOpen,
    /// Primary sequence closed; tool groups may follow
    TextClosed,
    /// Terminator written
    Terminated,
    /// A send failed; nothing more is sent
    Aborted,
}

/// Per-connection event sequencer
///
/// Owns the block index counter for one response stream. Every event is
/// handed to the sink before the call returns; a failed send aborts the
/// stream and every later call fails fast.
#[derive(Debug)]
pub struct EventStreamEmitter<S> {
    sink: S,
    model: String,
    index: u32,
    state: State,
}

impl<S: FrameSink> EventStreamEmitter<S> {
    /// Create an emitter echoing `model` in `message_start`
    pub fn new(sink: S, model: impl Into<String>) -> Self {
        Self {
            sink,
            model: model.into(),
            index: 0,
            state: State::Idle,
        }
    }

    /// Current block index
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Whether `start` has been emitted
    pub const fn has_started(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Give back the underlying sink
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Emit `message_start`, the text block start, and a ping
    ///
    /// # Errors
    ///
    /// Fails if the stream was already started or a send fails
    pub fn start(&mut self) -> Result<(), AdapterError> {
        self.require_state(State::Idle, "message_start")?;

        self.emit(&StreamEvent::MessageStart {
            message: StreamMessage {
                id: format!("msg_{}", generate_id()),
                message_type: "message".to_owned(),
                role: "assistant".to_owned(),
                model: self.model.clone(),
                content: Vec::new(),
                stop_reason: None,
                stop_sequence: None,
                usage: Usage {
                    input_tokens: 0,
                    output_tokens: 0,
                    cache_read_input_tokens: None,
                },
            },
        })?;
        self.emit(&StreamEvent::ContentBlockStart {
            index: self.index,
            content_block: StreamContentBlock::Text { text: String::new() },
        })?;
        self.emit(&StreamEvent::Ping)?;

        self.state = State::TextOpen;
        Ok(())
    }

    /// Emit one text delta on the open text block
    ///
    /// # Errors
    ///
    /// Fails if the text block is not open or the send fails
    pub fn text_delta(&mut self, text: &str) -> Result<(), AdapterError> {
        self.require_state(State::TextOpen, "content_block_delta")?;

        self.emit(&StreamEvent::ContentBlockDelta {
            index: self.index,
            delta: StreamDelta::TextDelta { text: text.to_owned() },
        })
    }

    /// Close the text block and the primary message
    ///
    /// # Errors
    ///
    /// Fails if called before [`start`](Self::start), twice, or if a send fails
    pub fn finish_text_block(&mut self) -> Result<(), AdapterError> {
        self.require_state(State::TextOpen, "content_block_stop")?;

        self.emit(&StreamEvent::ContentBlockStop { index: self.index })?;
        self.emit(&StreamEvent::MessageStop)?;

        self.state = State::TextClosed;
        Ok(())
    }

    /// Emit a complete tool-use block group for one invocation
    ///
    /// Returns the generated call identifier.
    ///
    /// # Errors
    ///
    /// Fails if the text block has not been closed yet, the stream was
    /// terminated, or a send fails
    pub fn tool_block(&mut self, invocation: &ToolInvocation) -> Result<String, AdapterError> {
        self.require_state(State::TextClosed, "tool_use block")?;

        self.index += 1;
        let id = format!("call_{}", generate_id());

        self.emit(&StreamEvent::ContentBlockStart {
            index: self.index,
            content_block: StreamContentBlock::ToolUse {
                id: id.clone(),
                name: invocation.name.clone(),
                input: Value::Object(serde_json::Map::new()),
            },
        })?;
        self.emit(&StreamEvent::ContentBlockDelta {
            index: self.index,
            delta: StreamDelta::InputJsonDelta {
                partial_json: invocation.arguments.clone(),
            },
        })?;
        self.emit(&StreamEvent::ContentBlockStop { index: self.index })?;
        self.emit(&StreamEvent::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason: Some(StopReason::ToolUse),
                stop_sequence: None,
            },
            usage: Usage {
                input_tokens: PLACEHOLDER_INPUT_TOKENS,
                output_tokens: PLACEHOLDER_OUTPUT_TOKENS,
                cache_read_input_tokens: Some(PLACEHOLDER_CACHE_READ_TOKENS),
            },
        })?;
        self.emit(&StreamEvent::MessageStop)?;

        Ok(id)
    }

    /// Send the end-of-transmission sentinel
    ///
    /// # Errors
    ///
    /// Fails if the text block is still open or the send fails
    pub fn terminate(&mut self) -> Result<(), AdapterError> {
        self.require_state(State::TextClosed, "terminator")?;

        self.send(Frame::Done)?;
        self.state = State::Terminated;
        Ok(())
    }

    fn require_state(&self, required: State, event: &'static str) -> Result<(), AdapterError> {
        match self.state {
            State::Aborted => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "event stream already aborted").into())
            }
            state if state == required => Ok(()),
            _ => Err(AdapterError::OutOfOrder(event)),
        }
    }

    fn emit(&mut self, event: &StreamEvent) -> Result<(), AdapterError> {
        let name = event.event_type();
        let data = serde_json::to_string(event).map_err(|e| anyhow::anyhow!("failed to encode {name}: {e}"))?;
        self.send(Frame::Event { name, data })
    }

    fn send(&mut self, frame: Frame) -> Result<(), AdapterError> {
        if let Err(e) = self.sink.send(frame) {
            self.state = State::Aborted;
            return Err(e.into());
        }
        Ok(())
    }
}
