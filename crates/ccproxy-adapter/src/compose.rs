//! Flattening of a structured messages request into one backend prompt
//!
//! The prompt is a sequence of tagged sections:
//!
//! ```text
//! <system>
//!   You are a helpful assistant.
//! </system>
//! <tools>
//!   USE TOOL
//!   ...
//! </tools>
//! <user>
//!   say hi
//! </user>
//! ```
//!
//! Every body is trimmed and each of its lines indented by two spaces.
//! Composition is a pure function of the request and the adapter config.

use std::fmt;

use ccproxy_config::AdapterConfig;
use serde_json::Value;

use crate::error::AdapterError;
use crate::protocol::anthropic::{ChatRequest, ContentPart, MessageContent, ToolDefinition};

const SYSTEM_TAG: &str = "system";
const TOOLS_TAG: &str = "tools";

/// A composed prompt ready for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    text: String,
    conversation_start: usize,
}

impl ComposedPrompt {
    /// Full prompt text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The part of the prompt following the `tools` section
    ///
    /// This is the conversation itself and is what gets logged; the tool
    /// contract is large and identical across turns.
    pub fn conversation(&self) -> &str {
        &self.text[self.conversation_start..]
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for ComposedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Turns requests into prompts under a fixed deny-list and tool contract
#[derive(Debug, Clone)]
pub struct PromptComposer {
    config: AdapterConfig,
}

impl PromptComposer {
    pub const fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    /// Compose the backend prompt for a request
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] when the request carries a
    /// tool-choice constraint or stop sequences, and
    /// [`AdapterError::Internal`] if a JSON part cannot be serialized.
    pub fn compose(&self, request: &ChatRequest) -> Result<ComposedPrompt, AdapterError> {
        check_supported(request)?;

        let mut text = String::new();

        for instruction in request.system_texts() {
            write_section(&mut text, SYSTEM_TAG, instruction);
        }

        let mut conversation_start = 0;
        let offered = self.offered_tools(request.tools());
        if !offered.is_empty() {
            write_section(&mut text, TOOLS_TAG, &self.tools_body(&offered)?);
            conversation_start = text.len();
        }

        for message in &request.messages {
            let role = message.role.as_str();
            match &message.content {
                MessageContent::Text(body) => write_section(&mut text, role, body),
                MessageContent::Parts(parts) => {
                    for part in parts {
                        match part {
                            ContentPart::Text(body) => write_section(&mut text, role, body),
                            ContentPart::Structured(value) => write_section(&mut text, role, &to_pretty_json(value)?),
                        }
                    }
                }
                MessageContent::Opaque(value) => write_section(&mut text, role, &to_pretty_json(value)?),
            }
        }

        Ok(ComposedPrompt {
            text,
            conversation_start,
        })
    }

    /// Tools that survive the deny-list, in request order
    fn offered_tools<'a>(&self, tools: &'a [ToolDefinition]) -> Vec<&'a ToolDefinition> {
        tools.iter().filter(|tool| !self.config.is_disabled(&tool.name)).collect()
    }

    /// Contract, worked examples and the JSON tool catalog
    fn tools_body(&self, tools: &[&ToolDefinition]) -> Result<String, AdapterError> {
        let contract = &self.config.tool_contract;
        let catalog = serde_json::to_string_pretty(tools)
            .map_err(|e| anyhow::anyhow!("failed to serialize tool catalog: {e}"))?;

        Ok(format!(
            "{}\n\n{}\n{catalog}",
            contract.instructions.trim_end(),
            contract.catalog_heading.trim_end()
        ))
    }
}

/// Reject request features the backend has no way to honor
///
/// Dropping them silently would change the meaning of the request.
fn check_supported(request: &ChatRequest) -> Result<(), AdapterError> {
    if request.tool_choice.as_ref().is_some_and(|choice| !is_empty_value(choice)) {
        return Err(AdapterError::Unsupported { feature: "tool_choice" });
    }

    if request.stop_sequences.as_ref().is_some_and(|stops| !stops.is_empty()) {
        return Err(AdapterError::Unsupported {
            feature: "stop_sequences",
        });
    }

    Ok(())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn to_pretty_json(value: &Value) -> Result<String, AdapterError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AdapterError::Internal(anyhow::anyhow!("failed to serialize content part: {e}")))
}

/// Append `<tag>`, the indented trimmed body, and `</tag>`
fn write_section(out: &mut String, tag: &str, body: &str) {
    out.push('<');
    out.push_str(tag);
    out.push_str(">\n");

    for line in body.trim().split('\n') {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }

    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}
