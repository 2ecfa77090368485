//! # bookify-readiness
//!
//! Waits for server-generated book PDFs to become available.
//!
//! After a book record exists, the backend renders its PDF in the background
//! and exposes only a boolean readiness flag. A view that wants to show the
//! PDF starts a polling session for the book and awaits its outcome:
//!
//! ```rust,ignore
//! use bookify_api::{BookClient, BookId, EnvToken};
//! use bookify_readiness::{PollConfig, ReadinessOutcome, ReadinessPoller};
//!
//! let client = BookClient::new("http://localhost:8080/api/book")?
//!     .with_credentials(EnvToken::default());
//! let poller = ReadinessPoller::new(client, PollConfig::book_details())?;
//!
//! let mut session = poller.start(BookId::new(42))?;
//! match session.outcome().await {
//!     Some(ReadinessOutcome::Ready(book)) => println!("{} is ready", book.title()),
//!     Some(other) => println!("{}", other.display_state()),
//!     None => println!("cancelled"),
//! }
//! ```
//!
//! ## Guarantees
//!
//! - At most one active session per book id per poller; `start` cancels the
//!   previous session for the same id.
//! - A session produces exactly one outcome (ready, timed out, needs sign-in,
//!   not found), or none if it is cancelled first.
//! - Transient failures are logged and polling continues; they still count
//!   toward the attempt ceiling.
//! - Dropping a [`SessionHandle`] cancels its session.

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod poller;
pub mod session;
pub mod source;
pub mod state;

pub use config::PollConfig;
pub use display::{DisplayState, Notice, Severity, UnavailableReason};
pub use error::{ReadinessError, Result};
pub use poller::{PollerStats, ReadinessPoller, SessionStats};
pub use session::{ReadinessOutcome, SessionHandle, SessionId};
pub use source::ReadinessSource;
pub use state::{Observation, Outcome, ReadinessMachine, Transition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DisplayState, Notice, PollConfig, ReadinessOutcome, ReadinessPoller, ReadinessSource,
        SessionHandle,
    };
    pub use bookify_api::{BookClient, BookDetail, BookId};
}
