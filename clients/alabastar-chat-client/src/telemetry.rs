//! Tracing setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ChatError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("ALABASTAR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            json_logs: std::env::var("ALABASTAR_JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Initialize tracing for the embedding application. Call once at
/// startup.
pub fn init_tracing(service_name: &str, config: &TelemetryConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ChatError::Config(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ChatError::Config(e.to_string()))?;
    }

    tracing::info!(
        service = service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Tracing initialized"
    );

    Ok(())
}
