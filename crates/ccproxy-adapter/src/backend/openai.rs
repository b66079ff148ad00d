//! OpenAI-compatible completion backend

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::Backend;
use crate::error::BackendError;
use ccproxy_config::BackendConfig;

/// Backend speaking the `/chat/completions` streaming protocol
///
/// The whole composed prompt travels as a single user message.
pub struct OpenAiBackend {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl OpenAiBackend {
    /// Create from backend configuration
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> Result<String, BackendError> {
        let wire_request = CompletionRequest {
            model,
            messages: [PromptMessage { role: "user", content: prompt }],
            stream: true,
        };

        let mut builder = self.client.post(self.completions_url()).json(&wire_request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(backend = self.name(), error = %e, "backend request failed");
            BackendError::Request(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(backend = self.name(), status = %status, "backend returned error");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut events = response.bytes_stream().eventsource();
        let mut answer = String::new();

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| BackendError::Stream(e.to_string()))?;
            let data = event.data.trim();
            if data == "[DONE]" {
                break;
            }

            let chunk = match serde_json::from_str::<StreamChunk>(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
                    continue;
                }
            };

            for text in chunk.choices.into_iter().filter_map(|c| c.delta.content) {
                if text.is_empty() {
                    continue;
                }
                on_fragment(&text);
                answer.push_str(&text);
            }
        }

        Ok(answer)
    }
}

// -- Wire types (only the fields this backend reads or writes) --

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [PromptMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamChoiceDelta,
}

#[derive(Debug, Deserialize)]
struct StreamChoiceDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> OpenAiBackend {
        OpenAiBackend::new(&BackendConfig {
            base_url: base_url.parse().unwrap(),
            api_key: None,
            model: None,
        })
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        assert_eq!(
            backend("http://127.0.0.1:8000/v1/").completions_url(),
            "http://127.0.0.1:8000/v1/chat/completions"
        );
        assert_eq!(
            backend("http://127.0.0.1:8000/v1").completions_url(),
            "http://127.0.0.1:8000/v1/chat/completions"
        );
    }

    #[test]
    fn request_carries_prompt_as_single_user_message() {
        let request = CompletionRequest {
            model: "m",
            messages: [PromptMessage {
                role: "user",
                content: "<user>\n  hi\n</user>\n",
            }],
            stream: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "<user>\n  hi\n</user>\n"}],
                "stream": true
            })
        );
    }

    #[test]
    fn chunk_without_content_decodes() {
        let raw = r#"{"id":"c","choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        let chunk: StreamChunk = serde_json::from_str(raw).unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
    }
}
