//! Boot: logging init and config load.

use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::TimingsConfig;

/// Initialise the tracing / logging subsystem.
///
/// Logs go to stderr; stdout carries the emitted metrics.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timings=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate configuration.
pub fn boot() -> Result<TimingsConfig, Box<dyn std::error::Error>> {
    info!("Starting timings v{}", env!("CARGO_PKG_VERSION"));

    let config = TimingsConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!(
        "Loaded configuration: parser={}, time_basis={}, max_line_size={}",
        config.parser, config.time_basis, config.max_line_size
    );
    if config.parser != crate::conf::ParserKind::Couch {
        info!(
            "Nginx: apdex satisfied<={}s tolerating<={}s, skip_patterns={:?}",
            config.apdex.satisfied_secs,
            4.0 * config.apdex.satisfied_secs,
            config.nginx.skip_patterns
        );
    }

    Ok(config)
}
