//! Tracing subscriber setup for binaries.
//!
//! Library code only emits `tracing` events; applications call
//! [`init_tracing`] once at startup to print them.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable console output.
    Console,
    /// JSON structured logging.
    Json,
}

impl TracingFormat {
    /// Parse a format name, defaulting to console output.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => TracingFormat::Json,
            _ => TracingFormat::Console,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Falls back to `RUST_LOG`, then to `info`, when the configured level is not
/// a valid filter.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match TracingFormat::from_name(&config.format) {
        TracingFormat::Console => fmt::layer().with_target(true).compact().boxed(),
        TracingFormat::Json => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(TracingFormat::from_name("json"), TracingFormat::Json);
        assert_eq!(TracingFormat::from_name("console"), TracingFormat::Console);
        assert_eq!(TracingFormat::from_name("other"), TracingFormat::Console);
    }
}
