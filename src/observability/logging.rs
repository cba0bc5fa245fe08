//! Structured logging via `tracing-subscriber`.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::{Error, Result};

/// Filter used when neither `ANNSTORE_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "annstore=info";

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event, with span context.
    Json,
}

impl LogFormat {
    /// Parses `"json"` or `"pretty"` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive string, e.g. `annstore=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Builds a config from the environment.
    ///
    /// The filter comes from `ANNSTORE_LOG`, then `RUST_LOG`, then
    /// [`DEFAULT_FILTER`]. `ANNSTORE_LOG_FORMAT` selects `json` or `pretty`.
    #[must_use]
    pub fn from_env() -> Self {
        let filter = std::env::var("ANNSTORE_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = std::env::var("ANNSTORE_LOG_FORMAT")
            .ok()
            .and_then(|f| LogFormat::parse(&f))
            .unwrap_or_default();
        Self { format, filter }
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.filter).map_err(|e| Error::OperationFailed {
            operation: "logging_init".to_string(),
            cause: format!("invalid filter '{}': {e}", self.filter),
        })
    }
}

/// Installs a global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the filter does not parse or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if LOGGING_INIT.get().is_some() {
        return Err(already_initialized("logging already initialized".to_string()));
    }

    let filter = config.env_filter()?;
    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .try_init()
            .map_err(|e| already_initialized(e.to_string()))?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .try_init()
            .map_err(|e| already_initialized(e.to_string()))?,
    }

    LOGGING_INIT
        .set(())
        .map_err(|()| already_initialized("logging already initialized".to_string()))
}

fn already_initialized(cause: String) -> Error {
    Error::OperationFailed {
        operation: "logging_init".to_string(),
        cause,
    }
}
