//! Error types for the bookify-readiness crate.

/// Errors raised when configuring or starting polling sessions.
///
/// Failures that happen while a session is polling are never surfaced as
/// errors; they become session outcomes instead.
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    /// Invalid polling configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A session was started outside of a tokio runtime
    #[error("No tokio runtime available to drive the polling session")]
    NoRuntime,
}

/// Convenience type alias for Results using ReadinessError.
pub type Result<T> = std::result::Result<T, ReadinessError>;
