//! Wire-facing types for companion connectivity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TransportError;
use crate::session::SessionPhase;
use crate::timer::TimerSnapshot;

/// Externally-observed companion connection state.
///
/// Value type compared by full structural equality; a new observation is
/// delivered to subscribers only when it differs from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionState {
    pub paired: bool,
    pub reachable: bool,
    pub companion_app_installed: bool,
}

/// Messages exchanged with the companion device.
///
/// Internal tagged-union contract between the orchestrator and the
/// delivery queue; exhaustively matched at the dispatch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompanionMessage {
    TimerStart { timer: TimerSnapshot },
    TimerPause { timer: TimerSnapshot },
    TimerResume { timer: TimerSnapshot },
    TimerComplete { timer: TimerSnapshot },
    TimerSkip { timer: TimerSnapshot },
    TimerStateUpdate { timer: TimerSnapshot },
    PhaseChange { phase: SessionPhase },
    FullSessionState {
        session_id: Uuid,
        elapsed_secs: u64,
        calories: f64,
        heart_rate: Option<u32>,
        phase: SessionPhase,
        progress_pct: u8,
    },
}

/// A message held in the delivery queue.
///
/// Never discarded: a repeatedly failing message is moved to the back of
/// the queue, not dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: Uuid,
    pub message: CompanionMessage,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
}

/// Best-known state of the companion's timer, mirrored locally so callers
/// can query it without a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTimerState {
    pub timer: TimerSnapshot,
    pub updated_at: DateTime<Utc>,
}

/// The raw transport to the companion device.
///
/// Reachability is sourced from an external notifier and treated as ground
/// truth; it is never inferred from send failures.
pub trait Transport: Send + Sync {
    fn send_raw(&self, message: &CompanionMessage) -> Result<(), TransportError>;
}
