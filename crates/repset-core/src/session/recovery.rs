//! Crash/termination recovery snapshots.
//!
//! Written when the app backgrounds, read once at process start, cleared on
//! clean session end. Persistence failures are logged and tracking
//! continues in memory; recovery is then simply unavailable next launch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionPhase;
use crate::health::HrSample;
use crate::storage::KvStore;

const RECOVERY_KEY: &str = "session/recovery";

/// Everything needed to rehydrate a session after process termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Workout-timer elapsed at snapshot time, excluding paused time.
    pub workout_elapsed_ms: u64,
    pub paused_accum_ms: u64,
    pub samples: Vec<HrSample>,
    pub calories: f64,
    pub progress_pct: u8,
    pub milestones_fired: Vec<u8>,
    pub completed_exercises: Vec<String>,
    pub phase: SessionPhase,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Persist `snapshot`, best effort.
pub fn save(store: &dyn KvStore, snapshot: &SessionSnapshot) {
    let bytes = match serde_json::to_vec(snapshot) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize recovery snapshot");
            return;
        }
    };
    if let Err(err) = store.set(RECOVERY_KEY, &bytes) {
        tracing::warn!(error = %err, "failed to persist recovery snapshot; continuing in memory");
    }
}

/// Load a previously persisted snapshot, if any. A corrupt snapshot is
/// logged and treated as absent.
pub fn load(store: &dyn KvStore) -> Option<SessionSnapshot> {
    let bytes = match store.get(RECOVERY_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read recovery snapshot");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            tracing::warn!(error = %err, "recovery snapshot is corrupt; ignoring it");
            None
        }
    }
}

/// Remove the snapshot after a clean session end.
pub fn clear(store: &dyn KvStore) {
    if let Err(err) = store.delete(RECOVERY_KEY) {
        tracing::warn!(error = %err, "failed to clear recovery snapshot");
    }
}
