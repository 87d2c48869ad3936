//! Structured logging setup.
//!
//! Logs are emitted through `tracing-subscriber` with an env-filter. JSON
//! output carries consistent fields for log shippers:
//! - `timestamp`, `level`, `target`
//! - `subsystem`: the emitting subsystem (mempool, block-builder, ...)
//! - event-specific fields (`tx_hash`, `block_number`, `sender`, ...)

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global log subscriber.
///
/// Installing twice (e.g. from several tests) is reported as an error and
/// leaves the first subscriber in place.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if !config.console_output {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level {}: {}", config.log_level, e)))?;

    let result = if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );
    Ok(())
}
