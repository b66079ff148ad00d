use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Deserialize;

use crate::{cors::CorsConfig, health::HealthConfig};

/// Address used when neither the config file nor the CLI names one
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9123);

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Configured listen address, falling back to `127.0.0.1:9123`
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address.unwrap_or(DEFAULT_LISTEN_ADDRESS)
    }
}
