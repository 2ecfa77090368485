//! What a view shows while it waits for a book.

use std::fmt;

/// Why a book could not be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    /// The attempt ceiling was reached; the PDF may still arrive later
    TimedOut,
    /// The book is private and the credential is missing or rejected
    NeedsSignIn,
    /// The book does not exist
    NotFound,
}

/// Display state of a view waiting on one book.
///
/// `Loading` is the initial state; every other state is terminal until the
/// view starts a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    Loading,
    Ready,
    Unavailable(UnavailableReason),
    Cancelled,
}

impl DisplayState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DisplayState::Loading)
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Loading => write!(f, "loading"),
            DisplayState::Ready => write!(f, "ready"),
            DisplayState::Unavailable(UnavailableReason::TimedOut) => {
                write!(f, "unavailable (still processing)")
            }
            DisplayState::Unavailable(UnavailableReason::NeedsSignIn) => {
                write!(f, "unavailable (sign-in required)")
            }
            DisplayState::Unavailable(UnavailableReason::NotFound) => {
                write!(f, "unavailable (not found)")
            }
            DisplayState::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Transient user-facing message for a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: &'static str,
}

impl Notice {
    pub const READY: Notice = Notice {
        severity: Severity::Success,
        message: "PDF is ready!",
    };

    pub const TIMED_OUT: Notice = Notice {
        severity: Severity::Warning,
        message: "PDF generation is taking longer than expected. Please refresh the page later.",
    };

    pub const NEEDS_SIGN_IN: Notice = Notice {
        severity: Severity::Error,
        message: "Please sign in to view this book.",
    };

    pub const NOT_FOUND: Notice = Notice {
        severity: Severity::Error,
        message: "This book does not exist.",
    };

    /// Notice for a terminal display state; `Loading` and `Cancelled` show none.
    pub fn for_state(state: DisplayState) -> Option<Notice> {
        match state {
            DisplayState::Ready => Some(Self::READY),
            DisplayState::Unavailable(UnavailableReason::TimedOut) => Some(Self::TIMED_OUT),
            DisplayState::Unavailable(UnavailableReason::NeedsSignIn) => Some(Self::NEEDS_SIGN_IN),
            DisplayState::Unavailable(UnavailableReason::NotFound) => Some(Self::NOT_FOUND),
            DisplayState::Loading | DisplayState::Cancelled => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Success => "ok",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!DisplayState::Loading.is_terminal());
        assert!(DisplayState::Ready.is_terminal());
        assert!(DisplayState::Cancelled.is_terminal());
        assert!(DisplayState::Unavailable(UnavailableReason::TimedOut).is_terminal());
    }

    #[test]
    fn test_notices() {
        assert_eq!(Notice::for_state(DisplayState::Ready), Some(Notice::READY));
        assert_eq!(
            Notice::for_state(DisplayState::Unavailable(UnavailableReason::TimedOut))
                .map(|n| n.severity),
            Some(Severity::Warning)
        );
        assert_eq!(
            Notice::for_state(DisplayState::Unavailable(UnavailableReason::NeedsSignIn)),
            Some(Notice::NEEDS_SIGN_IN)
        );
        assert_eq!(Notice::for_state(DisplayState::Loading), None);
        assert_eq!(Notice::for_state(DisplayState::Cancelled), None);
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(DisplayState::Loading.to_string(), "loading");
        assert_eq!(
            DisplayState::Unavailable(UnavailableReason::NotFound).to_string(),
            "unavailable (not found)"
        );
        assert_eq!(Notice::READY.to_string(), "[ok] PDF is ready!");
    }
}
