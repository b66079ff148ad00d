//! Anthropic Messages API wire format types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// -- Request types --

/// Anthropic messages API request
///
/// Sampling parameters are accepted so real clients parse cleanly, but the
/// backend receives only the composed prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// System instructions, either a single string or a list of text blocks
    #[serde(default)]
    pub system: Option<SystemPrompt>,
    /// Conversation messages in conversation order
    pub messages: Vec<InputMessage>,
    /// Tool definitions
    #[serde(default)]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool choice constraint
    #[serde(default)]
    pub tool_choice: Option<Value>,
    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Option<Vec<String>>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: Option<bool>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Top-k sampling
    #[serde(default)]
    pub top_k: Option<u32>,
    /// Caller metadata (e.g. `user_id`)
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Extended thinking configuration
    #[serde(default)]
    pub thinking: Option<Value>,
}

impl ChatRequest {
    /// System instruction texts in request order
    pub fn system_texts(&self) -> Vec<&str> {
        match &self.system {
            None => Vec::new(),
            Some(SystemPrompt::Text(text)) => vec![text.as_str()],
            Some(SystemPrompt::Blocks(blocks)) => blocks.iter().map(|b| b.text.as_str()).collect(),
        }
    }

    /// Tool definitions in request order
    pub fn tools(&self) -> &[ToolDefinition] {
        self.tools.as_deref().unwrap_or_default()
    }
}

/// Top-level system prompt
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    /// Plain text (shorthand)
    Text(String),
    /// Array of text blocks
    Blocks(Vec<SystemBlock>),
}

/// Text block of a system prompt
#[derive(Debug, Clone, Deserialize)]
pub struct SystemBlock {
    /// The instruction text
    pub text: String,
}

/// Anthropic message
#[derive(Debug, Clone, Deserialize)]
pub struct InputMessage {
    /// Author of the message
    pub role: Role,
    /// Message content
    pub content: MessageContent,
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name, also used as the prompt section tag
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Message content, classified once at parse time
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Plain text (shorthand)
    Text(String),
    /// Ordered content parts
    Parts(Vec<ContentPart>),
    /// Any other JSON value, kept as-is
    Opaque(Value),
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Self::Text(text),
            Value::Array(parts) => Self::Parts(parts.into_iter().map(ContentPart::from).collect()),
            other => Self::Opaque(other),
        })
    }
}

/// A single part of a list-valued message content
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// `{"type": "text", "text": ...}`
    Text(String),
    /// Any other part (`tool_use`, `tool_result`, `image`, ...), kept verbatim
    Structured(Value),
}

impl From<Value> for ContentPart {
    fn from(value: Value) -> Self {
        let is_text = value.get("type").and_then(Value::as_str) == Some("text");
        if is_text {
            let text = value.get("text").and_then(Value::as_str).unwrap_or_default();
            Self::Text(text.to_owned())
        } else {
            Self::Structured(value)
        }
    }
}

/// Anthropic tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for input parameters
    #[serde(default)]
    pub input_schema: Value,
}

// -- Streaming types --

/// Anthropic SSE event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Stream started
    MessageStart {
        /// Partial message with metadata
        message: StreamMessage,
    },
    /// New content block started
    ContentBlockStart {
        /// Block index
        index: u32,
        /// Initial block content
        content_block: StreamContentBlock,
    },
    /// Incremental content within a block
    ContentBlockDelta {
        /// Block index
        index: u32,
        /// Delta content
        delta: StreamDelta,
    },
    /// Content block finished
    ContentBlockStop {
        /// Block index
        index: u32,
    },
    /// Message metadata delta (stop reason, usage)
    MessageDelta {
        /// Delta with stop reason
        delta: MessageDeltaBody,
        /// Usage counters
        usage: Usage,
    },
    /// Message completed
    MessageStop,
    /// Keep-alive
    Ping,
}

impl StreamEvent {
    /// SSE `event:` name for this event
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::ContentBlockStart { .. } => "content_block_start",
            Self::ContentBlockDelta { .. } => "content_block_delta",
            Self::ContentBlockStop { .. } => "content_block_stop",
            Self::MessageDelta { .. } => "message_delta",
            Self::MessageStop => "message_stop",
            Self::Ping => "ping",
        }
    }

    /// Block index for block-scoped events
    pub const fn index(&self) -> Option<u32> {
        match self {
            Self::ContentBlockStart { index, .. }
            | Self::ContentBlockDelta { index, .. }
            | Self::ContentBlockStop { index } => Some(*index),
            _ => None,
        }
    }
}

/// Partial message in a `message_start` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    /// Response identifier
    pub id: String,
    /// Object type (always "message")
    #[serde(rename = "type")]
    pub message_type: String,
    /// Role (always "assistant")
    pub role: String,
    /// Model the client asked for
    pub model: String,
    /// Content blocks (always empty at start)
    pub content: Vec<Value>,
    /// Stop reason (always null at start)
    pub stop_reason: Option<StopReason>,
    /// Stop sequence (always null)
    pub stop_sequence: Option<String>,
    /// Initial usage
    pub usage: Usage,
}

/// Content block in a `content_block_start` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamContentBlock {
    /// Text block
    Text {
        /// Initial text (always empty)
        text: String,
    },
    /// Tool use block
    ToolUse {
        /// Tool call identifier
        id: String,
        /// Tool name
        name: String,
        /// Initial input (always an empty object)
        input: Value,
    },
}

/// Delta content in a `content_block_delta` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamDelta {
    /// Incremental text
    TextDelta {
        /// Text fragment
        text: String,
    },
    /// Tool input JSON
    InputJsonDelta {
        /// JSON fragment
        partial_json: String,
    },
}

/// Delta in a `message_delta` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaBody {
    /// Stop reason
    pub stop_reason: Option<StopReason>,
    /// Stop sequence
    pub stop_sequence: Option<String>,
}

/// Why the assistant stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
}

/// Anthropic token usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens
    pub input_tokens: u32,
    /// Output tokens
    pub output_tokens: u32,
    /// Tokens served from the prompt cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
}
