use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::health::ExerciseAggregate;

/// Final rollup returned by a clean session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Wall-clock session length minus accumulated paused time.
    pub active_secs: u64,
    pub avg_bpm: Option<u32>,
    pub max_bpm: Option<u32>,
    pub total_calories: f64,
    pub sets_completed: u32,
    pub exercises: Vec<ExerciseAggregate>,
}
