mod display;
mod engine;

pub use display::{format_mm_ss, TimerDisplay};
pub use engine::{TimerEngine, TimerKind, TimerSnapshot, TimerState};
