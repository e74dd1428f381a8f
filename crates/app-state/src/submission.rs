//! Submission state machine
//!
//! Every form owns one `SubmissionCell`. The cell enforces the single-flight
//! rule (at most one attempt in `Submitting`) and hands out an `AttemptId` per
//! attempt so completions from an attempt that has since been reset are
//! recognised and dropped.
//!
//! Resetting abandons an attempt but cannot recall its gateway call. The cell
//! remembers that call as outstanding and refuses new attempts until the
//! abandoned one reports back, so a form never has two calls in flight.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Submission errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Another attempt is still in flight
    #[error("A submission is already in flight")]
    AlreadySubmitting,

    /// The completion belongs to an attempt that is no longer current
    #[error("Stale completion for attempt {0}")]
    Stale(u64),
}

/// Result type for submission transitions
pub type Result<T> = std::result::Result<T, SubmissionError>;

/// Submission state of one form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SubmissionState {
    /// Nothing in flight
    #[default]
    Idle,

    /// Waiting on the gateway
    Submitting,

    /// The last attempt succeeded
    Succeeded,

    /// The last attempt failed with a user-facing message
    Failed(String),
}

impl SubmissionState {
    /// Whether an attempt is in flight
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    /// Whether a new attempt may start
    pub fn accepts_submit(&self) -> bool {
        !self.is_submitting()
    }

    /// Failure message of the last attempt
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            SubmissionState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one attempt handed out by [`SubmissionCell::try_begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Sequence number of the attempt
    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: SubmissionState,
    generation: u64,
    outstanding: Option<u64>,
}

impl Inner {
    fn settle(&mut self, attempt: AttemptId) {
        if self.outstanding == Some(attempt.0) {
            self.outstanding = None;
        }
    }
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    changes: watch::Sender<SubmissionState>,
}

/// Shared handle to a form's submission state
///
/// Clones refer to the same state. Transitions are atomic, so two overlapping
/// `try_begin` calls can never both succeed.
#[derive(Debug, Clone)]
pub struct SubmissionCell {
    shared: Arc<Shared>,
}

impl SubmissionCell {
    /// Create a cell in `Idle`
    pub fn new() -> Self {
        let (changes, _) = watch::channel(SubmissionState::Idle);
        Self {
            shared: Arc::new(Shared { inner: Mutex::new(Inner::default()), changes }),
        }
    }

    /// Current state
    pub fn state(&self) -> SubmissionState {
        self.shared.inner.lock().state.clone()
    }

    /// Watch state changes (for spinner and disabled-button rendering)
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.shared.changes.subscribe()
    }

    /// Start an attempt
    ///
    /// Accepted from `Idle`, `Succeeded` and `Failed`; rejected while
    /// `Submitting` and while an abandoned attempt's call is still out.
    pub fn try_begin(&self) -> Result<AttemptId> {
        let mut inner = self.shared.inner.lock();
        if inner.state.is_submitting() || inner.outstanding.is_some() {
            return Err(SubmissionError::AlreadySubmitting);
        }

        inner.generation += 1;
        inner.outstanding = Some(inner.generation);
        let attempt = AttemptId(inner.generation);
        self.transition(&mut inner, SubmissionState::Submitting);
        Ok(attempt)
    }

    /// Complete an attempt successfully
    pub fn succeed(&self, attempt: AttemptId) -> Result<()> {
        self.complete(attempt, SubmissionState::Succeeded)
    }

    /// Complete an attempt with a failure message
    pub fn fail(&self, attempt: AttemptId, message: impl Into<String>) -> Result<()> {
        self.complete(attempt, SubmissionState::Failed(message.into()))
    }

    /// Return to `Idle` from any state
    ///
    /// An attempt in flight is abandoned: its completion will be reported as
    /// stale. Its call stays outstanding until that completion (or
    /// [`SubmissionCell::release`]) arrives.
    pub fn reset(&self) {
        let mut inner = self.shared.inner.lock();
        inner.generation += 1;
        self.transition(&mut inner, SubmissionState::Idle);
    }

    /// Fold a settled outcome (`Succeeded` or `Failed`) back to `Idle`
    ///
    /// Does nothing while `Submitting`.
    pub fn clear_outcome(&self) {
        let mut inner = self.shared.inner.lock();
        if matches!(inner.state, SubmissionState::Succeeded | SubmissionState::Failed(_)) {
            self.transition(&mut inner, SubmissionState::Idle);
        }
    }

    /// Record that `attempt`'s call returned without completing the attempt
    pub fn release(&self, attempt: AttemptId) {
        self.shared.inner.lock().settle(attempt);
    }

    /// Whether a gateway call is out, current or abandoned
    pub fn is_busy(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.state.is_submitting() || inner.outstanding.is_some()
    }

    /// Whether `attempt` is the one in flight
    pub fn is_current(&self, attempt: AttemptId) -> bool {
        let inner = self.shared.inner.lock();
        inner.generation == attempt.0 && inner.state.is_submitting()
    }

    fn complete(&self, attempt: AttemptId, next: SubmissionState) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        inner.settle(attempt);
        if inner.generation != attempt.0 || !inner.state.is_submitting() {
            return Err(SubmissionError::Stale(attempt.0));
        }
        self.transition(&mut inner, next);
        Ok(())
    }

    fn transition(&self, inner: &mut Inner, next: SubmissionState) {
        tracing::debug!(from = ?inner.state, to = ?next, "submission state change");
        inner.state = next.clone();
        self.shared.changes.send_replace(next);
    }
}

impl Default for SubmissionCell {
    fn default() -> Self {
        Self::new()
    }
}
