//! Readiness state machine
//!
//! The transition logic of a polling session, free of timers and I/O. The
//! session driver feeds it one observation per tick and acts on the
//! returned transition.

use bookify_api::ApiError;

use crate::display::{DisplayState, Notice, UnavailableReason};

/// What one tick learned about the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// The PDF is ready and the full resource was fetched
    Ready(T),
    NotReady,
    /// Network, server or decode failure; the next tick tries again
    Transient,
    NeedsSignIn,
    NotFound,
}

impl<T> Observation<T> {
    /// Classify a failed request.
    pub fn from_error(error: &ApiError) -> Self {
        if error.requires_sign_in() {
            Observation::NeedsSignIn
        } else if error.is_not_found() {
            Observation::NotFound
        } else {
            Observation::Transient
        }
    }
}

/// Terminal result of a session. Exactly one is produced per session unless
/// the session is cancelled first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ready(T),
    TimedOut { attempts: u32 },
    NeedsSignIn,
    NotFound,
}

impl<T> Outcome<T> {
    pub fn display_state(&self) -> DisplayState {
        match self {
            Outcome::Ready(_) => DisplayState::Ready,
            Outcome::TimedOut { .. } => DisplayState::Unavailable(UnavailableReason::TimedOut),
            Outcome::NeedsSignIn => DisplayState::Unavailable(UnavailableReason::NeedsSignIn),
            Outcome::NotFound => DisplayState::Unavailable(UnavailableReason::NotFound),
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            Outcome::Ready(_) => Notice::READY,
            Outcome::TimedOut { .. } => Notice::TIMED_OUT,
            Outcome::NeedsSignIn => Notice::NEEDS_SIGN_IN,
            Outcome::NotFound => Notice::NOT_FOUND,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Result of feeding an observation to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<T> {
    /// Keep ticking
    Continue,
    /// The session just reached a terminal state
    Finish(Outcome<T>),
    /// The machine was already terminal; the observation is stale
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ReadinessMachine {
    attempts: u32,
    max_attempts: Option<u32>,
    state: DisplayState,
}

impl ReadinessMachine {
    pub fn new(max_attempts: Option<u32>) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            state: DisplayState::Loading,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Count a new attempt. Returns the attempt number, or `None` once the
    /// machine is terminal.
    pub fn begin_tick(&mut self) -> Option<u32> {
        if self.is_terminal() {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        Some(self.attempts)
    }

    pub fn observe<T>(&mut self, observation: Observation<T>) -> Transition<T> {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        let outcome = match observation {
            Observation::Ready(value) => Outcome::Ready(value),
            Observation::NeedsSignIn => Outcome::NeedsSignIn,
            Observation::NotFound => Outcome::NotFound,
            Observation::NotReady | Observation::Transient => match self.max_attempts {
                Some(max) if self.attempts >= max => Outcome::TimedOut {
                    attempts: self.attempts,
                },
                _ => return Transition::Continue,
            },
        };

        self.state = outcome.display_state();
        Transition::Finish(outcome)
    }

    /// Returns `false` if the machine had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = DisplayState::Cancelled;
        true
    }
}
