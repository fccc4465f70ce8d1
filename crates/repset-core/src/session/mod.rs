//! Workout session orchestration.
//!
//! Composes the timer engine, health correlation, and delivery queue into
//! a full session: start/pause/resume/end, exercise and set progression,
//! milestone detection, background sample buffering, and crash recovery.

mod orchestrator;
mod recovery;
mod rest_policy;
mod summary;

pub use orchestrator::{SessionConfig, SessionOrchestrator};
pub use recovery::SessionSnapshot;
pub use rest_policy::{RestPolicy, MAX_REST_SECS, MIN_REST_SECS};
pub use summary::WorkoutSummary;

use serde::{Deserialize, Serialize};

/// Session lifecycle state. `Ending` is transient while the final summary
/// is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Paused,
    Ending,
}

/// Visual phase shown for the current part of the workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Warmup,
    Strength,
    Core,
    Cooldown,
}

/// Target muscle group of an exercise. Drives the visual phase and the
/// default rest duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Cardio,
    Mobility,
}

impl MuscleGroup {
    pub fn phase(&self) -> SessionPhase {
        match self {
            MuscleGroup::Cardio => SessionPhase::Warmup,
            MuscleGroup::Core => SessionPhase::Core,
            MuscleGroup::Mobility => SessionPhase::Cooldown,
            MuscleGroup::Chest
            | MuscleGroup::Back
            | MuscleGroup::Legs
            | MuscleGroup::Shoulders
            | MuscleGroup::Arms => SessionPhase::Strength,
        }
    }

    /// Default rest between sets, before per-set and learned overrides.
    pub fn default_rest_secs(&self) -> u64 {
        match self {
            MuscleGroup::Legs => 90,
            MuscleGroup::Back | MuscleGroup::Chest => 75,
            MuscleGroup::Shoulders => 60,
            MuscleGroup::Arms | MuscleGroup::Core => 45,
            MuscleGroup::Cardio | MuscleGroup::Mobility => 30,
        }
    }
}

/// One planned exercise within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePlan {
    pub id: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    /// When set, starting this exercise creates a countdown timer of this
    /// length.
    pub suggested_duration_secs: Option<u64>,
    pub planned_sets: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muscle_groups_map_to_phases() {
        assert_eq!(MuscleGroup::Cardio.phase(), SessionPhase::Warmup);
        assert_eq!(MuscleGroup::Chest.phase(), SessionPhase::Strength);
        assert_eq!(MuscleGroup::Core.phase(), SessionPhase::Core);
        assert_eq!(MuscleGroup::Mobility.phase(), SessionPhase::Cooldown);
    }

    #[test]
    fn default_rest_is_heavier_for_larger_groups() {
        assert!(MuscleGroup::Legs.default_rest_secs() > MuscleGroup::Arms.default_rest_secs());
    }
}
