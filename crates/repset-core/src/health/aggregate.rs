//! Per-exercise and per-workout rollups over timer health windows.

use serde::{Deserialize, Serialize};

use super::correlation::TimerHealthWindow;
use super::sample::{max_bpm, mean_bpm, HrSample};
use crate::timer::TimerKind;

/// Rollup of all windows belonging to one exercise.
///
/// Exercise-time and rest-time totals are kept separate, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseAggregate {
    pub exercise_id: String,
    pub name: String,
    /// Total seconds spent in exercise-kind windows.
    pub exercise_secs: u64,
    /// Total seconds spent in rest-kind windows.
    pub rest_secs: u64,
    pub sets: usize,
    pub avg_bpm: Option<u32>,
    pub max_bpm: Option<u32>,
}

/// Workout-level rollup across all exercises and windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutAggregate {
    pub exercises: Vec<ExerciseAggregate>,
    pub total_calories: f64,
    pub avg_bpm: Option<u32>,
    pub max_bpm: Option<u32>,
}

/// Aggregate the windows of a single exercise.
///
/// `windows` is pre-filtered by the caller to this exercise; kinds are
/// split here so exercise and rest durations stay independent sums.
pub fn aggregate_exercise(
    windows: &[TimerHealthWindow],
    exercise_id: &str,
    name: &str,
) -> ExerciseAggregate {
    let mut exercise_secs = 0u64;
    let mut rest_secs = 0u64;
    let mut sets = 0usize;
    let mut all_samples: Vec<HrSample> = Vec::new();

    for window in windows {
        match window.kind {
            TimerKind::Exercise => {
                exercise_secs += window.duration_secs;
                sets += 1;
            }
            TimerKind::Rest => rest_secs += window.duration_secs,
            TimerKind::Workout => {}
        }
        all_samples.extend_from_slice(&window.samples);
    }

    ExerciseAggregate {
        exercise_id: exercise_id.to_string(),
        name: name.to_string(),
        exercise_secs,
        rest_secs,
        sets,
        avg_bpm: mean_bpm(&all_samples),
        max_bpm: max_bpm(&all_samples),
    }
}

/// Aggregate a whole workout from its exercise rollups and the full window
/// list. A window with no calorie attribution contributes 0.
pub fn aggregate_workout(
    exercise_aggregates: Vec<ExerciseAggregate>,
    all_windows: &[TimerHealthWindow],
) -> WorkoutAggregate {
    let total_calories = all_windows
        .iter()
        .map(|w| w.calories.unwrap_or(0.0))
        .sum();

    let all_samples: Vec<HrSample> = all_windows
        .iter()
        .flat_map(|w| w.samples.iter().copied())
        .collect();

    WorkoutAggregate {
        exercises: exercise_aggregates,
        total_calories,
        avg_bpm: mean_bpm(&all_samples),
        max_bpm: max_bpm(&all_samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{window_metrics, HrSample, SampleSource};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn window(kind: TimerKind, secs: i64, bpm: &[u32]) -> TimerHealthWindow {
        let start = Utc::now();
        let samples: Vec<HrSample> = bpm
            .iter()
            .enumerate()
            .map(|(i, &b)| HrSample::new(b, start + Duration::seconds(i as i64), SampleSource::OnBody))
            .collect();
        window_metrics(
            &samples,
            Uuid::new_v4(),
            kind,
            start,
            start + Duration::seconds(secs),
            Some("squat".into()),
            None,
        )
    }

    #[test]
    fn exercise_and_rest_durations_stay_separate() {
        let windows = vec![
            window(TimerKind::Exercise, 45, &[120, 130]),
            window(TimerKind::Rest, 60, &[100]),
            window(TimerKind::Exercise, 45, &[140]),
        ];
        let agg = aggregate_exercise(&windows, "ex-1", "Squat");
        assert_eq!(agg.exercise_secs, 90);
        assert_eq!(agg.rest_secs, 60);
        assert_eq!(agg.sets, 2);
        assert_eq!(agg.max_bpm, Some(140));
        // (120 + 130 + 100 + 140) / 4 = 122.5 -> 123
        assert_eq!(agg.avg_bpm, Some(123));
    }

    #[test]
    fn workout_calories_default_absent_windows_to_zero() {
        let mut w1 = window(TimerKind::Exercise, 30, &[110]);
        w1.calories = Some(12.5);
        let w2 = window(TimerKind::Rest, 30, &[]); // no calorie attribution
        let agg = aggregate_workout(vec![], &[w1, w2]);
        assert!((agg.total_calories - 12.5).abs() < f64::EPSILON);
        assert_eq!(agg.avg_bpm, Some(110));
    }

    #[test]
    fn empty_workout_has_absent_heart_rate() {
        let agg = aggregate_workout(vec![], &[]);
        assert_eq!(agg.avg_bpm, None);
        assert_eq!(agg.max_bpm, None);
        assert_eq!(agg.total_calories, 0.0);
    }
}
