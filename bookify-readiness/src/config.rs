//! Configuration for readiness polling
//!
//! One [`PollConfig`] replaces the per-page interval and ceiling constants.
//! The credential half of the configuration lives on the status source
//! (see [`BookClient::with_credentials`](bookify_api::BookClient::with_credentials)).

use std::time::Duration;

use crate::error::ReadinessError;

/// Tick period and optional attempt ceiling for a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between status requests; the first request fires one period
    /// after the session starts
    /// Default: 1 second
    pub period: Duration,

    /// Give up after this many status requests. `None` polls until the book
    /// is ready, a terminal error occurs, or the session is cancelled.
    /// Default: 120
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::book_details()
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book details page: every second for up to two minutes
    pub fn book_details() -> Self {
        Self {
            period: Duration::from_secs(1),
            max_attempts: Some(120),
        }
    }

    /// Creation form: every two seconds with no ceiling
    pub fn creation_form() -> Self {
        Self {
            period: Duration::from_secs(2),
            max_attempts: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn uncapped(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Upper bound on how long a capped session can poll.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_attempts
            .map(|attempts| self.period.saturating_mul(attempts))
    }

    pub fn validate(&self) -> Result<(), ReadinessError> {
        if self.period.is_zero() {
            return Err(ReadinessError::Configuration(
                "Poll period must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == Some(0) {
            return Err(ReadinessError::Configuration(
                "Max attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
