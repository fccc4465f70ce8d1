//! Workout timer engine.
//!
//! The engine is a wall-clock-based state machine owning every live timer.
//! It does not use internal threads - the caller (normally the session
//! runtime's ~100 ms loop) is responsible for calling `tick_all()`
//! periodically. Elapsed and remaining time are recomputed from timestamp
//! deltas on every observation, never from tick counting, so cadence only
//! affects display smoothness, not correctness.
//!
//! ## State Transitions
//!
//! ```text
//! Created -> Running <-> Paused -> (Stopped | Completed)
//! ```
//!
//! `Completed` is reached automatically when a countdown timer's remaining
//! time hits zero while running. `Stopped` is reached by explicit `stop`
//! from any non-terminal state. Both are terminal; only `clear` removes a
//! terminal timer.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::TimerError;
use crate::events::TimerEvent;
use crate::subscribers::{SubscriptionId, Subscribers};

/// Smallest adjustment step, in seconds. Requested deltas are rounded to
/// the nearest multiple.
pub const ADJUST_STEP_SECS: i64 = 15;
/// Countdown duration bounds after adjustment, in seconds.
pub const MIN_DURATION_SECS: u64 = 15;
pub const MAX_DURATION_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Countdown timer for a timed exercise.
    Exercise,
    /// Countdown timer for rest between sets.
    Rest,
    /// Count-up timer spanning the whole workout. No target duration;
    /// exposes remaining = 0 always and cannot be adjusted.
    Workout,
}

impl TimerKind {
    pub fn is_countdown(&self) -> bool {
        !matches!(self, TimerKind::Workout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Created,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl TimerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimerState::Completed | TimerState::Stopped)
    }
}

/// Value-copy view of a timer, handed to subscribers and callers.
/// The timer itself is owned exclusively by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub id: Uuid,
    pub kind: TimerKind,
    pub state: TimerState,
    pub duration_secs: u64,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub exercise_id: Option<String>,
    pub set_index: Option<u32>,
}

#[derive(Debug, Clone)]
struct WorkoutTimer {
    id: Uuid,
    kind: TimerKind,
    state: TimerState,
    duration_secs: u64,
    exercise_id: Option<String>,
    set_index: Option<u32>,
    /// Epoch ms of the last transition into Running. `Some` iff the timer
    /// is running - this is the single active driver slot per timer.
    run_anchor_ms: Option<u64>,
    /// Active milliseconds banked across previous running segments.
    /// Paused time never enters this sum.
    banked_active_ms: u64,
}

impl WorkoutTimer {
    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.run_anchor_ms {
            Some(anchor) => self.banked_active_ms + now_ms.saturating_sub(anchor),
            None => self.banked_active_ms,
        }
    }

    fn remaining_ms(&self, now_ms: u64) -> u64 {
        if !self.kind.is_countdown() {
            return 0;
        }
        (self.duration_secs * 1000).saturating_sub(self.elapsed_ms(now_ms))
    }

    fn snapshot(&self, now_ms: u64) -> TimerSnapshot {
        let raw_elapsed_secs = self.elapsed_ms(now_ms) / 1000;
        // Countdown elapsed never exceeds duration, so that
        // remaining + elapsed == duration at every observation.
        let elapsed_secs = if self.kind.is_countdown() {
            raw_elapsed_secs.min(self.duration_secs)
        } else {
            raw_elapsed_secs
        };
        let remaining_secs = if self.kind.is_countdown() {
            self.duration_secs - elapsed_secs
        } else {
            0
        };
        TimerSnapshot {
            id: self.id,
            kind: self.kind,
            state: self.state,
            duration_secs: self.duration_secs,
            elapsed_secs,
            remaining_secs,
            exercise_id: self.exercise_id.clone(),
            set_index: self.set_index,
        }
    }
}

/// Owns all live timers and their subscriber sets.
pub struct TimerEngine {
    clock: Arc<dyn Clock>,
    timers: HashMap<Uuid, WorkoutTimer>,
    global_subs: Subscribers<TimerEvent>,
    per_timer_subs: HashMap<Uuid, Subscribers<TimerEvent>>,
}

impl TimerEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: HashMap::new(),
            global_subs: Subscribers::new(),
            per_timer_subs: HashMap::new(),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create a timer. Countdown kinds start with remaining = duration and
    /// elapsed = 0; the workout kind ignores `duration_secs` and counts up
    /// without bound.
    pub fn create(
        &mut self,
        kind: TimerKind,
        duration_secs: u64,
        exercise_id: Option<String>,
        set_index: Option<u32>,
    ) -> Uuid {
        self.create_with_elapsed(kind, duration_secs, exercise_id, set_index, 0)
    }

    /// Create a timer with pre-banked elapsed time. Used when rehydrating a
    /// recovered session's workout timer.
    pub fn create_with_elapsed(
        &mut self,
        kind: TimerKind,
        duration_secs: u64,
        exercise_id: Option<String>,
        set_index: Option<u32>,
        elapsed_ms: u64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let timer = WorkoutTimer {
            id,
            kind,
            state: TimerState::Created,
            duration_secs: if kind.is_countdown() { duration_secs } else { 0 },
            exercise_id,
            set_index,
            run_anchor_ms: None,
            banked_active_ms: elapsed_ms,
        };
        let event = TimerEvent::Created {
            timer: timer.snapshot(self.clock.now_ms()),
            at: self.clock.now(),
        };
        self.timers.insert(id, timer);
        self.notify(id, &event);
        id
    }

    /// Start a created or paused timer. No-op if already running.
    pub fn start(&mut self, id: Uuid) -> Result<(), TimerError> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        match timer.state {
            TimerState::Running => return Ok(()),
            TimerState::Created | TimerState::Paused => {
                timer.state = TimerState::Running;
                timer.run_anchor_ms = Some(now_ms);
            }
            state => {
                return Err(TimerError::InvalidTransition {
                    action: "start",
                    state,
                })
            }
        }
        let event = TimerEvent::Started {
            timer: timer.snapshot(now_ms),
            at: now,
        };
        self.notify(id, &event);
        Ok(())
    }

    /// Pause a running timer. Stops its driver slot and banks the elapsed
    /// active time; elapsed/remaining freeze until resume.
    pub fn pause(&mut self, id: Uuid) -> Result<(), TimerError> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if timer.state != TimerState::Running {
            return Err(TimerError::InvalidTransition {
                action: "pause",
                state: timer.state,
            });
        }
        timer.banked_active_ms = timer.elapsed_ms(now_ms);
        timer.run_anchor_ms = None;
        timer.state = TimerState::Paused;
        let event = TimerEvent::Paused {
            timer: timer.snapshot(now_ms),
            at: now,
        };
        self.notify(id, &event);
        Ok(())
    }

    /// Resume a paused timer. Elapsed continues from wall-clock-derived
    /// values; the paused interval never enters the elapsed sum.
    pub fn resume(&mut self, id: Uuid) -> Result<(), TimerError> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if timer.state != TimerState::Paused {
            return Err(TimerError::InvalidTransition {
                action: "resume",
                state: timer.state,
            });
        }
        timer.state = TimerState::Running;
        timer.run_anchor_ms = Some(now_ms);
        let event = TimerEvent::Resumed {
            timer: timer.snapshot(now_ms),
            at: now,
        };
        self.notify(id, &event);
        Ok(())
    }

    /// Stop a timer from any non-terminal state. Terminal.
    pub fn stop(&mut self, id: Uuid) -> Result<(), TimerError> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if timer.state.is_terminal() {
            return Err(TimerError::InvalidTransition {
                action: "stop",
                state: timer.state,
            });
        }
        timer.banked_active_ms = timer.elapsed_ms(now_ms);
        timer.run_anchor_ms = None;
        timer.state = TimerState::Stopped;
        let event = TimerEvent::Stopped {
            timer: timer.snapshot(now_ms),
            at: now,
        };
        self.notify(id, &event);
        Ok(())
    }

    /// Adjust a countdown timer's duration by `delta_secs`.
    ///
    /// The delta is rounded to the nearest 15-second increment and the
    /// resulting duration clamped to [15, 300] seconds; remaining shifts by
    /// the same clamped delta, floored at 0. No-op for the workout kind.
    pub fn adjust(&mut self, id: Uuid, delta_secs: i64) -> Result<(), TimerError> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if !timer.kind.is_countdown() {
            return Ok(());
        }
        if timer.state.is_terminal() {
            return Err(TimerError::InvalidTransition {
                action: "adjust",
                state: timer.state,
            });
        }
        let rounded = ((delta_secs as f64 / ADJUST_STEP_SECS as f64).round() as i64)
            * ADJUST_STEP_SECS;
        let new_duration = (timer.duration_secs as i64 + rounded)
            .clamp(MIN_DURATION_SECS as i64, MAX_DURATION_SECS as i64)
            as u64;
        if new_duration == timer.duration_secs {
            return Ok(());
        }
        timer.duration_secs = new_duration;
        let event = TimerEvent::Adjusted {
            timer: timer.snapshot(now_ms),
            at: now,
        };
        self.notify(id, &event);
        Ok(())
    }

    /// Remove a timer, releasing its driver slot and per-timer subscribers.
    /// Idempotent; no further events for this timer are observable after
    /// this returns.
    pub fn clear(&mut self, id: Uuid) {
        if let Some(timer) = self.timers.remove(&id) {
            let event = TimerEvent::Cleared {
                timer: timer.snapshot(self.clock.now_ms()),
                at: self.clock.now(),
            };
            self.notify(id, &event);
        }
        self.per_timer_subs.remove(&id);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: Uuid) -> Option<TimerSnapshot> {
        let now_ms = self.clock.now_ms();
        self.timers.get(&id).map(|t| t.snapshot(now_ms))
    }

    /// Snapshots of all running and paused timers.
    pub fn list_active(&self) -> Vec<TimerSnapshot> {
        let now_ms = self.clock.now_ms();
        self.timers
            .values()
            .filter(|t| matches!(t.state, TimerState::Running | TimerState::Paused))
            .map(|t| t.snapshot(now_ms))
            .collect()
    }

    /// Active timers decorated with progress ratio and MM:SS display.
    pub fn list_active_with_display(&self) -> Vec<super::TimerDisplay> {
        self.list_active()
            .into_iter()
            .map(super::TimerDisplay::from_snapshot)
            .collect()
    }

    // ── Periodic update ──────────────────────────────────────────────

    /// Flush wall-clock elapsed time into every running timer.
    ///
    /// Countdown timers whose remaining time has hit zero are completed.
    /// Emits one event per running timer and returns them so a caller-
    /// driven loop can react to completions without subscribing.
    pub fn tick_all(&mut self) -> Vec<TimerEvent> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let mut events = Vec::new();
        let running: Vec<Uuid> = self
            .timers
            .values()
            .filter(|t| t.state == TimerState::Running)
            .map(|t| t.id)
            .collect();
        for id in running {
            let timer = match self.timers.get_mut(&id) {
                Some(t) => t,
                None => continue,
            };
            if timer.kind.is_countdown() && timer.remaining_ms(now_ms) == 0 {
                timer.banked_active_ms = timer.elapsed_ms(now_ms);
                timer.run_anchor_ms = None;
                timer.state = TimerState::Completed;
                events.push(TimerEvent::Completed {
                    timer: timer.snapshot(now_ms),
                    at: now,
                });
            } else {
                events.push(TimerEvent::Tick {
                    timer: timer.snapshot(now_ms),
                    at: now,
                });
            }
        }
        for event in &events {
            self.notify(event.timer().id, event);
        }
        events
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to one timer's events.
    pub fn subscribe(
        &mut self,
        id: Uuid,
        callback: Box<dyn Fn(&TimerEvent) + Send>,
    ) -> Result<SubscriptionId, TimerError> {
        if !self.timers.contains_key(&id) {
            return Err(TimerError::NotFound(id));
        }
        Ok(self
            .per_timer_subs
            .entry(id)
            .or_default()
            .insert(callback))
    }

    /// Subscribe to every timer's events.
    pub fn subscribe_all(&mut self, callback: Box<dyn Fn(&TimerEvent) + Send>) -> SubscriptionId {
        self.global_subs.insert(callback)
    }

    /// Remove a subscription wherever it lives. Synchronous: no callback
    /// runs after this returns.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.global_subs.remove(id) {
            return true;
        }
        self.per_timer_subs.values_mut().any(|subs| subs.remove(id))
    }

    fn notify(&self, timer_id: Uuid, event: &TimerEvent) {
        if let Some(subs) = self.per_timer_subs.get(&timer_id) {
            subs.notify(event);
        }
        self.global_subs.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine_with_clock() -> (TimerEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (TimerEngine::new(clock.clone()), clock)
    }

    #[test]
    fn countdown_invariant_holds_at_every_observation() {
        let (mut engine, clock) = engine_with_clock();
        let id = engine.create(TimerKind::Exercise, 60, None, None);
        engine.start(id).unwrap();
        for _ in 0..20 {
            clock.advance(Duration::milliseconds(700));
            engine.tick_all();
            let snap = engine.get(id).unwrap();
            assert_eq!(snap.remaining_secs + snap.elapsed_secs, snap.duration_secs);
        }
    }

    #[test]
    fn countdown_completes_when_remaining_hits_zero() {
        let (mut engine, clock) = engine_with_clock();
        let id = engine.create(TimerKind::Rest, 30, None, Some(1));
        engine.start(id).unwrap();
        clock.advance(Duration::seconds(30));
        let events = engine.tick_all();
        assert!(matches!(events[0], TimerEvent::Completed { .. }));
        let snap = engine.get(id).unwrap();
        assert_eq!(snap.state, TimerState::Completed);
        assert_eq!(snap.remaining_secs, 0);
        // Terminal: no restart.
        assert!(engine.start(id).is_err());
    }

    #[test]
    fn workout_kind_counts_up_without_bound() {
        let (mut engine, clock) = engine_with_clock();
        let id = engine.create(TimerKind::Workout, 999, None, None);
        engine.start(id).unwrap();
        clock.advance(Duration::seconds(400));
        engine.tick_all();
        let snap = engine.get(id).unwrap();
        assert_eq!(snap.state, TimerState::Running);
        assert_eq!(snap.elapsed_secs, 400);
        assert_eq!(snap.remaining_secs, 0);
        assert_eq!(snap.duration_secs, 0); // duration ignored at creation
    }

    #[test]
    fn pause_excludes_paused_time_from_elapsed() {
        let (mut engine, clock) = engine_with_clock();
        let id = engine.create(TimerKind::Exercise, 120, None, None);
        engine.start(id).unwrap();
        clock.advance(Duration::seconds(10));
        engine.pause(id).unwrap();
        clock.advance(Duration::seconds(500)); // while paused
        engine.resume(id).unwrap();
        clock.advance(Duration::seconds(5));
        engine.tick_all();
        let snap = engine.get(id).unwrap();
        assert_eq!(snap.elapsed_secs, 15);
        assert_eq!(snap.remaining_secs, 105);
        assert_eq!(snap.duration_secs, 120); // duration preserved exactly
    }

    #[test]
    fn start_is_noop_when_already_running() {
        let (mut engine, clock) = engine_with_clock();
        let id = engine.create(TimerKind::Exercise, 60, None, None);
        engine.start(id).unwrap();
        clock.advance(Duration::seconds(7));
        engine.start(id).unwrap(); // must not reset the anchor
        let snap = engine.get(id).unwrap();
        assert_eq!(snap.elapsed_secs, 7);
    }

    #[test]
    fn invalid_transitions_are_errors_without_side_effects() {
        let (mut engine, _clock) = engine_with_clock();
        let id = engine.create(TimerKind::Exercise, 60, None, None);
        assert!(matches!(
            engine.pause(id),
            Err(TimerError::InvalidTransition { action: "pause", .. })
        ));
        assert!(matches!(
            engine.resume(id),
            Err(TimerError::InvalidTransition { action: "resume", .. })
        ));
        assert_eq!(engine.get(id).unwrap().state, TimerState::Created);
        engine.stop(id).unwrap();
        assert!(engine.stop(id).is_err()); // stop is terminal
    }

    #[test]
    fn adjust_rounds_and_clamps() {
        let (mut engine, _clock) = engine_with_clock();
        let id = engine.create(TimerKind::Rest, 60, None, None);

        engine.adjust(id, 22).unwrap(); // rounds to +15
        assert_eq!(engine.get(id).unwrap().duration_secs, 75);

        engine.adjust(id, 1000).unwrap(); // clamps to max
        assert_eq!(engine.get(id).unwrap().duration_secs, 300);

        engine.adjust(id, -1000).unwrap(); // clamps to min
        assert_eq!(engine.get(id).unwrap().duration_secs, 15);
    }

    #[test]
    fn adjust_is_noop_for_workout_kind() {
        let (mut engine, _clock) = engine_with_clock();
        let id = engine.create(TimerKind::Workout, 0, None, None);
        engine.adjust(id, 60).unwrap();
        assert_eq!(engine.get(id).unwrap().duration_secs, 0);
    }

    #[test]
    fn adjust_shifts_remaining_and_floors_at_zero() {
        let (mut engine, clock) = engine_with_clock();
        let id = engine.create(TimerKind::Rest, 90, None, None);
        engine.start(id).unwrap();
        clock.advance(Duration::seconds(80));
        engine.tick_all();
        engine.adjust(id, -60).unwrap(); // duration 90 -> 30, elapsed 80
        let snap = engine.get(id).unwrap();
        assert_eq!(snap.remaining_secs, 0);
        assert_eq!(snap.elapsed_secs + snap.remaining_secs, snap.duration_secs);
    }

    #[test]
    fn clear_is_idempotent_and_releases_subscribers() {
        let (mut engine, _clock) = engine_with_clock();
        let id = engine.create(TimerKind::Exercise, 60, None, None);
        engine
            .subscribe(id, Box::new(|_| {}))
            .unwrap();
        engine.clear(id);
        engine.clear(id); // second clear is a no-op
        assert!(engine.get(id).is_none());
        assert!(engine.subscribe(id, Box::new(|_| {})).is_err());
    }

    #[test]
    fn list_active_is_running_union_paused() {
        let (mut engine, _clock) = engine_with_clock();
        let a = engine.create(TimerKind::Exercise, 60, None, None);
        let b = engine.create(TimerKind::Rest, 60, None, None);
        let _created_only = engine.create(TimerKind::Rest, 60, None, None);
        engine.start(a).unwrap();
        engine.start(b).unwrap();
        engine.pause(b).unwrap();
        let active = engine.list_active();
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn subscribers_observe_transitions_and_unsubscribe_is_final() {
        static HITS: AtomicUsize = AtomicUsize::new(0);
        let (mut engine, _clock) = engine_with_clock();
        let id = engine.create(TimerKind::Exercise, 60, None, None);
        let sub = engine
            .subscribe(id, Box::new(|_| {
                HITS.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        engine.start(id).unwrap();
        let after_start = HITS.load(Ordering::SeqCst);
        assert!(after_start >= 1);
        assert!(engine.unsubscribe(sub));
        engine.pause(id).unwrap();
        assert_eq!(HITS.load(Ordering::SeqCst), after_start);
    }
}
