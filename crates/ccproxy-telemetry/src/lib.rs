//! Logging setup for ccproxy
//!
//! Installs a `tracing-subscriber` registry with an env filter and a
//! text or JSON formatting layer.

use ccproxy_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber
///
/// `log_filter` uses `EnvFilter` directive syntax (e.g. `info,ccproxy_adapter=debug`);
/// an unparseable filter falls back to `info`.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed
pub fn init(config: &TelemetryConfig, log_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
