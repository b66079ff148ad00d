use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Completion backend the composed prompts are sent to
///
/// The backend speaks the OpenAI chat-completions protocol; the adapter
/// only ever sends it a single user message carrying the whole prompt.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Endpoint root, e.g. `http://127.0.0.1:8000/v1`
    pub base_url: Url,
    /// Bearer token sent with every request
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Model sent to the backend instead of the one the client asked for
    #[serde(default)]
    pub model: Option<String>,
}
