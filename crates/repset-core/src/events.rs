//! Crate-wide event types.
//!
//! Every state change produces an event. The host UI polls the
//! orchestrator for [`SessionEvent`]s; timer subscribers receive
//! [`TimerEvent`]s by value-copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionPhase;
use crate::timer::TimerSnapshot;

/// Timer engine events, delivered to per-timer and global subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    Created { timer: TimerSnapshot, at: DateTime<Utc> },
    Started { timer: TimerSnapshot, at: DateTime<Utc> },
    Paused { timer: TimerSnapshot, at: DateTime<Utc> },
    Resumed { timer: TimerSnapshot, at: DateTime<Utc> },
    Stopped { timer: TimerSnapshot, at: DateTime<Utc> },
    Completed { timer: TimerSnapshot, at: DateTime<Utc> },
    Adjusted { timer: TimerSnapshot, at: DateTime<Utc> },
    Cleared { timer: TimerSnapshot, at: DateTime<Utc> },
    /// Periodic update while running.
    Tick { timer: TimerSnapshot, at: DateTime<Utc> },
}

impl TimerEvent {
    /// The snapshot carried by any variant.
    pub fn timer(&self) -> &TimerSnapshot {
        match self {
            TimerEvent::Created { timer, .. }
            | TimerEvent::Started { timer, .. }
            | TimerEvent::Paused { timer, .. }
            | TimerEvent::Resumed { timer, .. }
            | TimerEvent::Stopped { timer, .. }
            | TimerEvent::Completed { timer, .. }
            | TimerEvent::Adjusted { timer, .. }
            | TimerEvent::Cleared { timer, .. }
            | TimerEvent::Tick { timer, .. } => timer,
        }
    }
}

/// Session orchestrator events, drained by the host after each command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionStarted {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    SessionPaused {
        at: DateTime<Utc>,
    },
    SessionResumed {
        at: DateTime<Utc>,
    },
    SessionEnded {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ExerciseStarted {
        exercise_id: String,
        name: String,
        at: DateTime<Utc>,
    },
    SetCompleted {
        exercise_id: String,
        set_index: u32,
        rest_secs: Option<u64>,
        at: DateTime<Utc>,
    },
    ExerciseCompleted {
        exercise_id: String,
        progress_pct: u8,
        at: DateTime<Utc>,
    },
    /// Fired exactly once per threshold per session.
    MilestoneReached {
        pct: u8,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: SessionPhase,
        at: DateTime<Utc>,
    },
    CaloriesUpdated {
        total: f64,
        at: DateTime<Utc>,
    },
    /// Background-buffered samples merged after foregrounding.
    SamplesMerged {
        added: usize,
        at: DateTime<Utc>,
    },
    RestTimerStarted {
        timer_id: Uuid,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
}
