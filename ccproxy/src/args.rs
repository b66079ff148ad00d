use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Anthropic messages proxy for flat-prompt backends
#[derive(Debug, Parser)]
#[command(name = "ccproxy", about = "Serve the Anthropic messages API from a flat-prompt completion backend")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ccproxy.toml", env = "CCPROXY_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "CCPROXY_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive, e.g. `info` or `ccproxy_adapter=debug`
    #[arg(long, default_value = "info", env = "CCPROXY_LOG")]
    pub log_filter: String,
}
