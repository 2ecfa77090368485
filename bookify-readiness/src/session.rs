//! A single polling session and the handle its owner holds.
//!
//! The session's outcome slot is the only place a terminal result can be
//! published. Finishing and cancelling both take the slot under one lock, so
//! a session publishes at most one outcome and never publishes after it has
//! been cancelled, even when a status response arrives late.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bookify_api::{BookDetail, BookId};
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::display::DisplayState;
use crate::source::ReadinessSource;
use crate::state::{Observation, Outcome, ReadinessMachine, Transition};

/// Terminal result of a session waiting on a book.
pub type ReadinessOutcome = Outcome<BookDetail>;

/// Identifies one session among the successive sessions started for a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// State shared between a session task, its handle and the poller registry.
pub(crate) struct SessionShared {
    id: SessionId,
    book_id: BookId,
    attempts: AtomicU32,
    state: watch::Sender<DisplayState>,
    outcome_tx: Mutex<Option<oneshot::Sender<ReadinessOutcome>>>,
}

impl SessionShared {
    pub(crate) fn new(
        id: SessionId,
        book_id: BookId,
    ) -> (
        Arc<Self>,
        oneshot::Receiver<ReadinessOutcome>,
        watch::Receiver<DisplayState>,
    ) {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(DisplayState::Loading);

        let shared = Arc::new(Self {
            id,
            book_id,
            attempts: AtomicU32::new(0),
            state: state_tx,
            outcome_tx: Mutex::new(Some(outcome_tx)),
        });

        (shared, outcome_rx, state_rx)
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn book_id(&self) -> BookId {
        self.book_id
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Neither finished nor cancelled.
    pub(crate) fn is_active(&self) -> bool {
        self.outcome_tx.lock().is_some()
    }

    fn record_attempt(&self, attempt: u32) {
        self.attempts.store(attempt, Ordering::Release);
    }

    /// Publish the terminal outcome. Returns `false` if the session already
    /// finished or was cancelled, in which case the outcome is dropped.
    fn finish(&self, outcome: ReadinessOutcome) -> bool {
        let mut slot = self.outcome_tx.lock();
        match slot.take() {
            Some(tx) => {
                self.state.send_replace(outcome.display_state());
                // The handle may already be gone; the state update still stands
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Returns `false` if the session had already finished or been cancelled.
    pub(crate) fn cancel(&self) -> bool {
        let mut slot = self.outcome_tx.lock();
        if slot.take().is_none() {
            return false;
        }
        self.state.send_replace(DisplayState::Cancelled);
        true
    }
}

/// Drive one session until it finishes or its slot is taken by a cancel.
pub(crate) async fn drive<S: ReadinessSource>(
    source: Arc<S>,
    config: PollConfig,
    shared: Arc<SessionShared>,
) {
    let book_id = shared.book_id();
    let session = shared.id();
    let mut machine = ReadinessMachine::new(config.max_attempts);

    // Ticks are sequential: the next one is not scheduled until this one
    // has finished, so a slow backend delays polling instead of stacking it
    let mut ticker = interval_at(Instant::now() + config.period, config.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        %book_id,
        %session,
        period = ?config.period,
        max_attempts = ?config.max_attempts,
        "Started readiness polling"
    );

    loop {
        ticker.tick().await;

        if !shared.is_active() {
            debug!(%book_id, %session, "Session cancelled, stopping");
            return;
        }

        let Some(attempt) = machine.begin_tick() else {
            return;
        };
        shared.record_attempt(attempt);

        let observation = observe(source.as_ref(), book_id, attempt).await;

        match machine.observe(observation) {
            Transition::Continue => {}
            Transition::Finish(outcome) => {
                let state = outcome.display_state();
                if shared.finish(outcome) {
                    info!(%book_id, %session, attempt, %state, "Readiness polling finished");
                } else {
                    debug!(%book_id, %session, "Discarding outcome of cancelled session");
                }
                return;
            }
            Transition::Ignored => return,
        }
    }
}

async fn observe<S: ReadinessSource>(
    source: &S,
    book_id: BookId,
    attempt: u32,
) -> Observation<BookDetail> {
    match source.status(book_id).await {
        Ok(status) if status.is_ready() => match source.resource(book_id).await {
            Ok(book) => Observation::Ready(book),
            Err(error) => {
                warn!(%book_id, attempt, %error, "PDF is ready but the book could not be fetched");
                Observation::from_error(&error)
            }
        },
        Ok(_) => {
            debug!(%book_id, attempt, "PDF not ready yet");
            Observation::NotReady
        }
        Err(error) => {
            let observation = Observation::from_error(&error);
            if matches!(observation, Observation::Transient) {
                warn!(%book_id, attempt, %error, "Error checking PDF status");
            } else {
                debug!(%book_id, attempt, %error, "PDF status check rejected");
            }
            observation
        }
    }
}

/// Owner's view of a running session.
///
/// Dropping the handle cancels the session, so a view that goes away takes
/// its polling with it.
#[must_use = "dropping a SessionHandle cancels its session"]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    abort: AbortHandle,
    outcome_rx: Option<oneshot::Receiver<ReadinessOutcome>>,
    state_rx: watch::Receiver<DisplayState>,
}

impl SessionHandle {
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        abort: AbortHandle,
        outcome_rx: oneshot::Receiver<ReadinessOutcome>,
        state_rx: watch::Receiver<DisplayState>,
    ) -> Self {
        Self {
            shared,
            abort,
            outcome_rx: Some(outcome_rx),
            state_rx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.shared.id()
    }

    pub fn book_id(&self) -> BookId {
        self.shared.book_id()
    }

    /// Status requests issued so far.
    pub fn attempts(&self) -> u32 {
        self.shared.attempts()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    pub fn state(&self) -> DisplayState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every display state change of this session.
    pub fn watch_state(&self) -> watch::Receiver<DisplayState> {
        self.state_rx.clone()
    }

    /// Stop polling. Returns `false` if the session had already finished or
    /// been cancelled.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.cancel();
        self.abort.abort();
        if cancelled {
            debug!(book_id = %self.book_id(), session = %self.id(), "Session cancelled by owner");
        }
        cancelled
    }

    /// Wait for the session's outcome.
    ///
    /// Returns `None` if the session was cancelled, or if the outcome was
    /// already taken by an earlier call.
    pub async fn outcome(&mut self) -> Option<ReadinessOutcome> {
        let rx = self.outcome_rx.take()?;
        rx.await.ok()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id())
            .field("book_id", &self.book_id())
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .finish()
    }
}
