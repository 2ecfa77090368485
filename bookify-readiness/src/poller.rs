//! Session registry keyed by book id
//!
//! The poller guarantees at most one active session per book. Starting a
//! session for a book that already has one cancels the old session first.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bookify_api::{BookClient, BookId};
use dashmap::DashMap;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::config::PollConfig;
use crate::error::{ReadinessError, Result};
use crate::session::{self, SessionHandle, SessionId, SessionShared};
use crate::source::ReadinessSource;

/// Registry entry for a running session.
struct ActiveSession {
    shared: Arc<SessionShared>,
    abort: AbortHandle,
}

impl ActiveSession {
    fn cancel(&self) -> bool {
        let cancelled = self.shared.cancel();
        self.abort.abort();
        cancelled
    }
}

/// Owned by a session task. Dropping it, whether the task returned, panicked
/// or was aborted, retires the session and removes its registry entry.
struct Registration {
    sessions: Arc<DashMap<BookId, ActiveSession>>,
    shared: Arc<SessionShared>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.shared.cancel();
        let id = self.shared.id();
        // A restart may already have replaced the entry
        self.sessions.remove_if(&self.shared.book_id(), |_, active| active.shared.id() == id);
    }
}

/// Starts and cancels readiness sessions against one source.
///
/// Dropping the poller cancels every session it started.
pub struct ReadinessPoller<S: ReadinessSource = BookClient> {
    source: Arc<S>,
    config: PollConfig,
    sessions: Arc<DashMap<BookId, ActiveSession>>,
    next_id: AtomicU64,
}

impl<S: ReadinessSource> ReadinessPoller<S> {
    pub fn new(source: S, config: PollConfig) -> Result<Self> {
        Self::with_shared_source(Arc::new(source), config)
    }

    pub fn with_shared_source(source: Arc<S>, config: PollConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            source,
            config,
            sessions: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Start waiting for `book_id`, cancelling any session already running
    /// for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, book_id: BookId) -> Result<SessionHandle> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ReadinessError::NoRuntime)?;

        if let Some((_, previous)) = self.sessions.remove(&book_id) {
            if previous.cancel() {
                info!(
                    %book_id,
                    session = %previous.shared.id(),
                    "Cancelled previous session before restart"
                );
            }
        }

        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (shared, outcome_rx, state_rx) = SessionShared::new(id, book_id);

        let task_source = Arc::clone(&self.source);
        let task_shared = Arc::clone(&shared);
        let config = self.config;
        // Moved into the future so it is dropped even if the task is aborted
        // before its first poll
        let registration = Registration {
            sessions: Arc::clone(&self.sessions),
            shared: Arc::clone(&shared),
        };

        let task = runtime.spawn(async move {
            let _registration = registration;
            session::drive(task_source, config, task_shared).await;
        });

        let active = ActiveSession {
            shared: Arc::clone(&shared),
            abort: task.abort_handle(),
        };
        if let Some(displaced) = self.sessions.insert(book_id, active) {
            // Lost a race with a concurrent start for the same book
            displaced.cancel();
        }

        // The task retires the session before removing its entry, so if it
        // already ended its removal may have run before the insert above
        if !shared.is_active() {
            self.sessions.remove_if(&book_id, |_, active| active.shared.id() == id);
        }

        Ok(SessionHandle::new(
            shared,
            task.abort_handle(),
            outcome_rx,
            state_rx,
        ))
    }

    /// Stop the session for `book_id`. A no-op returning `false` when there
    /// is none.
    pub fn cancel(&self, book_id: BookId) -> bool {
        match self.sessions.remove(&book_id) {
            Some((_, active)) => {
                let cancelled = active.cancel();
                if cancelled {
                    debug!(%book_id, session = %active.shared.id(), "Session cancelled");
                }
                cancelled
            }
            None => false,
        }
    }

    /// Cancel every running session, returning how many were stopped.
    pub fn cancel_all(&self) -> usize {
        // Collect first; removing while iterating a DashMap deadlocks
        let book_ids: Vec<BookId> = self.sessions.iter().map(|entry| *entry.key()).collect();

        book_ids
            .into_iter()
            .filter(|book_id| self.cancel(*book_id))
            .count()
    }

    pub fn is_polling(&self, book_id: BookId) -> bool {
        self.sessions
            .get(&book_id)
            .map(|active| active.shared.is_active())
            .unwrap_or(false)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.shared.is_active())
            .count()
    }

    pub fn stats(&self) -> PollerStats {
        let mut sessions: Vec<SessionStats> = self
            .sessions
            .iter()
            .filter(|entry| entry.shared.is_active())
            .map(|entry| SessionStats {
                book_id: *entry.key(),
                session_id: entry.shared.id(),
                attempts: entry.shared.attempts(),
            })
            .collect();
        sessions.sort_by_key(|stats| stats.book_id);

        PollerStats {
            period: self.config.period,
            max_attempts: self.config.max_attempts,
            sessions,
        }
    }
}

impl<S: ReadinessSource> Drop for ReadinessPoller<S> {
    fn drop(&mut self) {
        let cancelled = self.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "Poller dropped, cancelled running sessions");
        }
    }
}

impl<S: ReadinessSource> fmt::Debug for ReadinessPoller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessPoller")
            .field("config", &self.config)
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}

/// Snapshot of one running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub book_id: BookId,
    pub session_id: SessionId,
    pub attempts: u32,
}

/// Snapshot of a poller.
#[derive(Debug, Clone)]
pub struct PollerStats {
    pub period: Duration,
    pub max_attempts: Option<u32>,
    pub sessions: Vec<SessionStats>,
}

impl fmt::Display for PollerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Readiness Poller Stats:")?;
        writeln!(f, "  Active sessions: {}", self.sessions.len())?;
        writeln!(f, "  Period: {:?}", self.period)?;
        match self.max_attempts {
            Some(max) => writeln!(f, "  Max attempts: {}", max)?,
            None => writeln!(f, "  Max attempts: unlimited")?,
        }

        if !self.sessions.is_empty() {
            writeln!(f, "  Sessions:")?;
            for stats in &self.sessions {
                writeln!(
                    f,
                    "    book {}: {} (attempts: {})",
                    stats.book_id, stats.session_id, stats.attempts
                )?;
            }
        }

        Ok(())
    }
}
