//! Core error types for repset-core.
//!
//! One error enum per concern, rolled up into [`CoreError`] with `#[from]`
//! conversions. Invalid state transitions are reported to the caller and
//! have no side effect; transport and persistence failures are recovered
//! locally and never reach this tree from the delivery path.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionStatus;
use crate::timer::TimerState;

/// Top-level error type for repset-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Timer engine errors.
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Unknown timer: {0}")]
    NotFound(uuid::Uuid),

    /// The requested transition is not legal from the timer's current state.
    #[error("Cannot {action} timer in state {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: TimerState,
    },
}

/// Session orchestrator errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A session is already active")]
    AlreadyActive,

    #[error("Operation requires session state {expected}, but session is {actual:?}")]
    InvalidState {
        expected: &'static str,
        actual: SessionStatus,
    },

    #[error("No exercise is currently in progress")]
    NoActiveExercise,

    #[error("Exercise '{0}' is not in the session plan")]
    UnknownExercise(String),
}

/// Durable key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Remote transport errors. Recovered locally by the delivery queue,
/// never surfaced to `send` callers.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Companion device is not reachable")]
    Unreachable,

    #[error("Send failed: {0}")]
    SendFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
