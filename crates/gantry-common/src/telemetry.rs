//! Telemetry initialization: structured logging for the engine
//!
//! Emits JSON logs by default so entries can be shipped straight to a
//! log aggregator. The filter is overridable through `RUST_LOG`.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to install the global tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directives used when `RUST_LOG` is not set
    pub default_filter: String,
    /// Emit JSON-formatted log lines instead of human-readable text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: "info,gantry=debug,hyper=warn,reqwest=warn".to_string(),
            json: true,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// Respects `RUST_LOG` when set, falling back to the configured default
/// filter. Returns an error if a subscriber was already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert!(config.json);
        assert!(config.default_filter.contains("gantry=debug"));
    }

    #[test]
    fn test_double_init_reports_error() {
        let config = TelemetryConfig {
            default_filter: "info".to_string(),
            json: false,
        };

        // Only one global subscriber may exist per process; whichever
        // test wins the race, the second call must surface the failure
        // instead of panicking.
        let first = init_telemetry(&config);
        let second = init_telemetry(&config);
        assert!(first.is_ok() || second.is_err());
    }
}
