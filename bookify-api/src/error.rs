//! Error types for the book API client.

use serde::Deserialize;

/// Errors returned by [`BookClient`](crate::BookClient) requests.
///
/// Every variant carries owned strings so errors can be cloned into test
/// scripts and passed across tasks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, timeout, I/O)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend requires a valid credential (HTTP 401)
    #[error("Authentication required")]
    Unauthorized,

    /// The credential does not grant access to this book (HTTP 403)
    #[error("Access denied")]
    Forbidden,

    /// The book does not exist
    #[error("Book not found")]
    NotFound,

    /// Any other 4xx response
    #[error("Request rejected with HTTP {status}: {message}")]
    Client { status: u16, message: String },

    /// 5xx response
    #[error("Server error HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The base URL or an endpoint derived from it is malformed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error body produced by the backend's exception handler.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Classify a non-success HTTP status and its body.
    ///
    /// The backend reports a missing book as HTTP 400 with a "not found"
    /// message, so that combination maps to [`ApiError::NotFound`].
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = Self::extract_message(body);

        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            400 if message.to_lowercase().contains("not found") => ApiError::NotFound,
            400..=499 => ApiError::Client { status, message },
            _ => ApiError::Server { status, message },
        }
    }

    /// Whether a later retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Server { .. } | ApiError::Decode(_)
        )
    }

    /// Whether the caller should be asked to sign in rather than retry.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    fn extract_message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(error), .. }) => error,
            Ok(ErrorBody { message: Some(message), .. }) => message,
            _ => body.trim().to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            ApiError::from_status(status.as_u16(), "")
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(error: url::ParseError) -> Self {
        ApiError::InvalidUrl(error.to_string())
    }
}

/// Convenience type alias for results from the book API.
pub type Result<T> = std::result::Result<T, ApiError>;
