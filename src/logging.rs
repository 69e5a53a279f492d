//! Structured logging setup using the tracing crate
//!
//! ## Environment variables
//!
//! - `LOG_LEVEL`: log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: output format (json, pretty, compact) - defaults to compact
//! - `RUST_LOG`: overrides log filtering (env_logger syntax)

use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Structured JSON for log aggregation
    Json,
    /// Human-readable with colors and indentation
    Pretty,
    /// Terminal-friendly, minimal spacing
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

/// Initialize logging with explicit settings
pub fn init_logging(level: Level, format: LogFormat) {
    let mut filter = EnvFilter::new(level.to_string())
        // Reduce noise from the runtime
        .add_directive("tokio=warn".parse().expect("static directive"));

    if let Ok(rust_log) = env::var("RUST_LOG") {
        filter = EnvFilter::new(rust_log);
    }

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Pretty => {
            registry.with(fmt::layer().pretty()).init();
        }
        LogFormat::Compact => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

/// Initialize logging from `LOG_LEVEL` and `LOG_FORMAT`
pub fn init_default_logging() {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| value.to_uppercase().parse().ok())
        .unwrap_or(Level::INFO);
    let format = env::var("LOG_FORMAT")
        .map(|value| LogFormat::parse(&value))
        .unwrap_or(LogFormat::Compact);
    init_logging(level, format);
}
