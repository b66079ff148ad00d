//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use ccproxy_config::{AdapterConfig, BackendConfig, Config, CorsConfig, ServerConfig, TelemetryConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config pointing at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                backend: BackendConfig {
                    base_url: base_url.parse().expect("valid URL"),
                    api_key: None,
                    model: None,
                },
                adapter: AdapterConfig::default(),
                telemetry: TelemetryConfig::default(),
            },
        }
    }

    /// Send a bearer token to the backend
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.config.backend.api_key = Some(SecretString::from(key));
        self
    }

    /// Replace the model sent to the backend
    pub fn with_backend_model(mut self, model: &str) -> Self {
        self.config.backend.model = Some(model.to_owned());
        self
    }

    /// Mark a tool as disabled (or explicitly enabled)
    pub fn with_disabled_tool(mut self, name: &str, disabled: bool) -> Self {
        self.config.adapter.disabled_tools.insert(name.to_owned(), disabled);
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = config;
        self
    }

    /// Move the health endpoint
    pub fn with_health_path(mut self, path: &str) -> Self {
        self.config.server.health.path = path.to_owned();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
