//! Sample-to-window correlation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sample::{max_bpm, mean_bpm, min_bpm, HrSample};
use crate::timer::TimerKind;

/// Samples from one timer's lifetime, with derived statistics.
///
/// Derived, never persisted independently. The statistics are `None` when
/// the window holds no samples -- callers must distinguish "no data" from
/// "zero value."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerHealthWindow {
    pub timer_id: Uuid,
    pub kind: TimerKind,
    pub exercise_id: Option<String>,
    pub set_index: Option<u32>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `floor((end - start) / 1000)` seconds, matching the truncation the
    /// timer engine uses for elapsed time.
    pub duration_secs: u64,
    pub samples: Vec<HrSample>,
    pub avg_bpm: Option<u32>,
    pub max_bpm: Option<u32>,
    pub min_bpm: Option<u32>,
    /// Calorie contribution attributed to this window, when known.
    pub calories: Option<f64>,
}

/// Return the subsequence of `samples` with `timestamp` in `[start, end]`,
/// inclusive on both ends, preserving the original order.
///
/// Pure function; no hidden state.
pub fn correlate(samples: &[HrSample], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<HrSample> {
    samples
        .iter()
        .copied()
        .filter(|s| s.at >= start && s.at <= end)
        .collect()
}

/// Build a [`TimerHealthWindow`] for one timer's `[start, end]` interval.
#[allow(clippy::too_many_arguments)]
pub fn window_metrics(
    samples: &[HrSample],
    timer_id: Uuid,
    kind: TimerKind,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exercise_id: Option<String>,
    set_index: Option<u32>,
) -> TimerHealthWindow {
    let correlated = correlate(samples, start, end);
    let duration_ms = (end - start).num_milliseconds().max(0) as u64;
    TimerHealthWindow {
        timer_id,
        kind,
        exercise_id,
        set_index,
        start,
        end,
        duration_secs: duration_ms / 1000,
        avg_bpm: mean_bpm(&correlated),
        max_bpm: max_bpm(&correlated),
        min_bpm: min_bpm(&correlated),
        calories: None,
        samples: correlated,
    }
}
