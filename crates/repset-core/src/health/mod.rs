//! Heart-rate correlation and aggregation.
//!
//! Maps time-stamped biometric samples onto timer windows and rolls the
//! windows up into per-exercise and per-workout statistics. Everything in
//! this module is a pure function over immutable samples; the orchestrator
//! owns the sample sequence.

mod aggregate;
mod correlation;
mod sample;

pub use aggregate::{aggregate_exercise, aggregate_workout, ExerciseAggregate, WorkoutAggregate};
pub use correlation::{correlate, window_metrics, TimerHealthWindow};
pub use sample::{HrSample, SampleSource};

pub(crate) use sample::{max_bpm, mean_bpm};
