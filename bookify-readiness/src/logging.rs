//! Logging setup for applications embedding the poller
//!
//! Sessions log through `tracing`; this module installs a subscriber for
//! binaries that do not bring their own.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber installed
    Silent,
    /// Compact stderr output, `info` by default
    Development,
    /// Verbose output with source locations, `debug` by default
    Debug,
}

impl LoggingMode {
    /// Parse a mode name as used in `BOOKIFY_LOG_MODE`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "silent" => Some(LoggingMode::Silent),
            "development" | "dev" => Some(LoggingMode::Development),
            "debug" => Some(LoggingMode::Debug),
            _ => None,
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `BOOKIFY_LOG_LEVEL`: filter directive (e.g. `debug`, `bookify_readiness=trace`)
/// - `RUST_LOG`: used when `BOOKIFY_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    if mode == LoggingMode::Silent {
        return Ok(());
    }

    let default_level = if mode == LoggingMode::Debug { "debug" } else { "info" };
    install(mode, create_env_filter(default_level)?)
}

/// Initialize logging with an explicit filter directive, ignoring the
/// environment.
pub fn init_logging_with_filter(mode: LoggingMode, directive: &str) -> Result<(), LoggingError> {
    if mode == LoggingMode::Silent {
        return Ok(());
    }

    install(mode, parse_filter(directive)?)
}

fn install(mode: LoggingMode, filter: EnvFilter) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Initialize logging from `BOOKIFY_LOG_MODE` ("silent", "development",
/// "debug"). Unset or unknown values select Development.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var("BOOKIFY_LOG_MODE")
        .ok()
        .and_then(|name| LoggingMode::from_name(&name))
        .unwrap_or(LoggingMode::Development);

    init_logging(mode)
}

/// Filter from `BOOKIFY_LOG_LEVEL`, then `RUST_LOG`, then `default_level`
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = std::env::var("BOOKIFY_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    parse_filter(&directive)
}

fn parse_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directive).map_err(|e| LoggingError::InvalidFilter {
        filter: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Whether a global subscriber is already installed.
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(LoggingMode::from_name("debug"), Some(LoggingMode::Debug));
        assert_eq!(LoggingMode::from_name(" Dev "), Some(LoggingMode::Development));
        assert_eq!(LoggingMode::from_name("silent"), Some(LoggingMode::Silent));
        assert_eq!(LoggingMode::from_name("loud"), None);
    }

    #[test]
    fn test_default_filter() {
        assert!(create_env_filter("info").is_ok());
    }

    #[test]
    fn test_filter_directives() {
        assert!(parse_filter("bookify_readiness=trace,warn").is_ok());
        assert!(matches!(
            parse_filter("bookify_readiness=loud"),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init_logging_with_filter(LoggingMode::Development, "warn");
        assert!(is_initialized());
        assert!(matches!(
            init_logging_with_filter(LoggingMode::Development, "warn"),
            Err(LoggingError::TracingInit(_))
        ));
    }

    #[test]
    fn test_silent_mode_ignores_filter() {
        assert!(init_logging_with_filter(LoggingMode::Silent, "not a =filter=").is_ok());
    }
}
