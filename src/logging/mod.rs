//! Tracing initialization for embedding front ends.
//!
//! The store itself only emits `tracing` events; the process that embeds it
//! decides where they go. This helper wires up the same stderr output the
//! rest of our servers use.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize tracing output.
///
/// Respects `RUST_LOG` when set, falling back to the configured level.
/// Must be called at most once per process.
pub fn init(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
