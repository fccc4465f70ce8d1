//! Display decoration for active timers.

use serde::{Deserialize, Serialize};

use super::engine::TimerSnapshot;

/// A timer snapshot decorated for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerDisplay {
    pub timer: TimerSnapshot,
    /// `(duration - remaining) / duration` for countdown kinds, 0.0 for
    /// the workout kind.
    pub progress: f64,
    /// Remaining time for countdown kinds, elapsed for the workout kind,
    /// formatted MM:SS.
    pub display: String,
}

impl TimerDisplay {
    pub fn from_snapshot(timer: TimerSnapshot) -> Self {
        let progress = if timer.kind.is_countdown() && timer.duration_secs > 0 {
            (timer.duration_secs - timer.remaining_secs) as f64 / timer.duration_secs as f64
        } else {
            0.0
        };
        let display = if timer.kind.is_countdown() {
            format_mm_ss(timer.remaining_secs)
        } else {
            format_mm_ss(timer.elapsed_secs)
        };
        Self {
            timer,
            progress,
            display,
        }
    }
}

/// Format whole seconds as MM:SS. Minutes are not capped at 59.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
