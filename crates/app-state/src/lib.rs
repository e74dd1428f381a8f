//! Application state management for Outfit Planner
//!
//! This crate provides the per-form submission state machine and the
//! process-wide session observer that gates protected screens.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;
pub mod submission;

pub use session::{SessionBoundGateway, SessionObserver, SessionStateError};
pub use submission::{AttemptId, SubmissionCell, SubmissionError, SubmissionState};
