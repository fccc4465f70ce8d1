//! Rest duration policy.
//!
//! Precedence: explicit per-set override > learned user preference >
//! muscle-group default. The chosen base is then lengthened for later sets
//! and for elevated live heart rate, and finally clamped.

use std::collections::{HashMap, VecDeque};

use super::ExercisePlan;

pub const MIN_REST_SECS: u64 = 30;
pub const MAX_REST_SECS: u64 = 180;

/// Adjustments remembered per exercise name; the preference activates once
/// this many exist.
const LEARNED_WINDOW: usize = 5;

/// Added for every set beyond the second.
const LATE_SET_BONUS_SECS: u64 = 15;

const ELEVATED_BPM: u32 = 140;
const HIGH_BPM: u32 = 160;
const ELEVATED_BONUS_SECS: u64 = 15;
const HIGH_BONUS_SECS: u64 = 30;

/// Learns per-exercise rest preferences from user adjustments and chooses
/// rest durations. Survives across sessions within one orchestrator.
#[derive(Debug, Default)]
pub struct RestPolicy {
    adjustments: HashMap<String, VecDeque<u64>>,
}

impl RestPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user adjustment of a rest timer for `exercise_name`.
    /// Only the most recent [`LEARNED_WINDOW`] adjustments are kept.
    pub fn record_adjustment(&mut self, exercise_name: &str, rest_secs: u64) {
        let window = self
            .adjustments
            .entry(exercise_name.to_string())
            .or_default();
        window.push_back(rest_secs);
        while window.len() > LEARNED_WINDOW {
            window.pop_front();
        }
    }

    /// Rolling average of the last adjustments, once enough exist.
    pub fn learned(&self, exercise_name: &str) -> Option<u64> {
        let window = self.adjustments.get(exercise_name)?;
        if window.len() < LEARNED_WINDOW {
            return None;
        }
        let sum: u64 = window.iter().sum();
        Some(sum / window.len() as u64)
    }

    /// Choose a rest duration for the set just completed.
    ///
    /// `set_number` is 1-based: the set whose rest this is. `live_bpm` is
    /// the most recent heart-rate reading, when one exists.
    pub fn choose(
        &self,
        exercise: &ExercisePlan,
        set_number: u32,
        override_secs: Option<u64>,
        live_bpm: Option<u32>,
    ) -> u64 {
        let mut secs = override_secs
            .or_else(|| self.learned(&exercise.name))
            .unwrap_or_else(|| exercise.muscle_group.default_rest_secs());

        if set_number > 2 {
            secs += LATE_SET_BONUS_SECS;
        }
        match live_bpm {
            Some(bpm) if bpm > HIGH_BPM => secs += HIGH_BONUS_SECS,
            Some(bpm) if bpm > ELEVATED_BPM => secs += ELEVATED_BONUS_SECS,
            _ => {}
        }
        secs.clamp(MIN_REST_SECS, MAX_REST_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MuscleGroup;

    fn bench() -> ExercisePlan {
        ExercisePlan {
            id: "ex-bench".into(),
            name: "Bench Press".into(),
            muscle_group: MuscleGroup::Chest,
            suggested_duration_secs: None,
            planned_sets: 4,
        }
    }

    #[test]
    fn override_beats_learned_beats_default() {
        let mut policy = RestPolicy::new();
        assert_eq!(policy.choose(&bench(), 1, None, None), 75); // group default

        for _ in 0..5 {
            policy.record_adjustment("Bench Press", 120);
        }
        assert_eq!(policy.choose(&bench(), 1, None, None), 120); // learned
        assert_eq!(policy.choose(&bench(), 1, Some(45), None), 45); // override
    }

    #[test]
    fn learning_needs_five_adjustments() {
        let mut policy = RestPolicy::new();
        for _ in 0..4 {
            policy.record_adjustment("Bench Press", 150);
        }
        assert_eq!(policy.learned("Bench Press"), None);
        policy.record_adjustment("Bench Press", 150);
        assert_eq!(policy.learned("Bench Press"), Some(150));
    }

    #[test]
    fn learned_window_is_rolling() {
        let mut policy = RestPolicy::new();
        for secs in [60, 60, 60, 60, 60, 110, 110, 110, 110, 110] {
            policy.record_adjustment("Bench Press", secs);
        }
        // Only the last five survive.
        assert_eq!(policy.learned("Bench Press"), Some(110));
    }

    #[test]
    fn later_sets_and_elevated_heart_rate_extend_rest() {
        let policy = RestPolicy::new();
        let base = policy.choose(&bench(), 2, None, None);
        assert_eq!(policy.choose(&bench(), 3, None, None), base + 15);
        assert_eq!(policy.choose(&bench(), 2, None, Some(150)), base + 15);
        assert_eq!(policy.choose(&bench(), 2, None, Some(170)), base + 30);
        assert_eq!(policy.choose(&bench(), 3, None, Some(170)), base + 45);
    }

    #[test]
    fn result_is_clamped_to_bounds() {
        let policy = RestPolicy::new();
        assert_eq!(policy.choose(&bench(), 1, Some(5), None), MIN_REST_SECS);
        assert_eq!(policy.choose(&bench(), 9, Some(600), Some(200)), MAX_REST_SECS);
    }
}
