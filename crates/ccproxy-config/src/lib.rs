#![allow(clippy::must_use_candidate)]

pub mod adapter;
pub mod backend;
pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use adapter::*;
pub use backend::*;
pub use cors::*;
pub use health::*;
pub use server::*;
pub use telemetry::*;

/// Top-level ccproxy configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Completion backend the prompts are sent to
    pub backend: BackendConfig,
    /// Prompt composition policy
    #[serde(default)]
    pub adapter: AdapterConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
