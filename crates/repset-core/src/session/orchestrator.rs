//! Session orchestrator.
//!
//! Owns every piece of mutable session state (single-writer discipline):
//! the timer engine, the sample sequence, the calorie counter, and the
//! delivery service. Other components communicate with it through
//! value-copy events. The host drives it with commands plus a periodic
//! `tick()`, normally via [`crate::runtime::SessionRuntime`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::recovery::{self, SessionSnapshot};
use super::rest_policy::RestPolicy;
use super::summary::WorkoutSummary;
use super::{ExercisePlan, SessionPhase, SessionStatus};
use crate::clock::Clock;
use crate::connectivity::{DeliveryService, Transport};
use crate::error::{CoreError, SessionError};
use crate::events::{SessionEvent, TimerEvent};
use crate::health::{self, HrSample, SampleSource, TimerHealthWindow};
use crate::sources::CalorieSource;
use crate::storage::KvStore;
use crate::timer::{TimerEngine, TimerKind};

const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Knobs for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Create a rest timer automatically when a set completes.
    pub auto_rest: bool,
    /// Seconds between calorie-source polls.
    pub calorie_refresh_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_rest: true,
            calorie_refresh_secs: 10,
        }
    }
}

/// Composes the timer engine, health correlation, and delivery queue into
/// a workout session.
pub struct SessionOrchestrator {
    clock: Arc<dyn Clock>,
    store: Arc<dyn KvStore>,
    calorie_source: Arc<dyn CalorieSource>,
    config: SessionConfig,

    timers: TimerEngine,
    delivery: DeliveryService,
    rest_policy: RestPolicy,

    status: SessionStatus,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    phase: SessionPhase,

    paused_accum_ms: u64,
    paused_since_ms: Option<u64>,
    /// Timers paused by `pause_session`, to resume with the session.
    resume_on_session_resume: Vec<Uuid>,

    samples: Vec<HrSample>,
    background_buffer: Vec<HrSample>,
    in_background: bool,
    accepting_samples: bool,

    calories: f64,
    last_calorie_poll_ms: u64,

    workout_timer: Option<Uuid>,
    exercise_timer: Option<Uuid>,
    rest_timer: Option<Uuid>,
    /// Window start per owned countdown timer, closed into `windows`.
    open_windows: HashMap<Uuid, DateTime<Utc>>,
    windows: Vec<TimerHealthWindow>,

    plan: Vec<ExercisePlan>,
    current_exercise: Option<ExercisePlan>,
    current_set: u32,
    sets_completed: u32,
    completed_exercises: HashSet<String>,
    progress_pct: u8,
    milestones_fired: HashSet<u8>,

    pending_events: Vec<SessionEvent>,
}

impl SessionOrchestrator {
    pub fn new(
        clock: Arc<dyn Clock>,
        store: Arc<dyn KvStore>,
        calorie_source: Arc<dyn CalorieSource>,
        transport: Arc<dyn Transport>,
        config: SessionConfig,
    ) -> Self {
        let timers = TimerEngine::new(clock.clone());
        let delivery = DeliveryService::new(transport, store.clone(), clock.clone());
        Self {
            clock,
            store,
            calorie_source,
            config,
            timers,
            delivery,
            rest_policy: RestPolicy::new(),
            status: SessionStatus::Idle,
            session_id: None,
            started_at: None,
            phase: SessionPhase::Warmup,
            paused_accum_ms: 0,
            paused_since_ms: None,
            resume_on_session_resume: Vec::new(),
            samples: Vec::new(),
            background_buffer: Vec::new(),
            in_background: false,
            accepting_samples: false,
            calories: 0.0,
            last_calorie_poll_ms: 0,
            workout_timer: None,
            exercise_timer: None,
            rest_timer: None,
            open_windows: HashMap::new(),
            windows: Vec::new(),
            plan: Vec::new(),
            current_exercise: None,
            current_set: 0,
            sets_completed: 0,
            completed_exercises: HashSet::new(),
            progress_pct: 0,
            milestones_fired: HashSet::new(),
            pending_events: Vec::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn progress_pct(&self) -> u8 {
        self.progress_pct
    }

    pub fn calories(&self) -> f64 {
        self.calories
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Most recent heart-rate reading, from whichever buffer is filling.
    pub fn current_heart_rate(&self) -> Option<u32> {
        if self.in_background {
            if let Some(sample) = self.background_buffer.last() {
                return Some(sample.bpm);
            }
        }
        self.samples.last().map(|s| s.bpm)
    }

    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerEngine {
        &mut self.timers
    }

    pub fn delivery(&self) -> &DeliveryService {
        &self.delivery
    }

    pub fn delivery_mut(&mut self) -> &mut DeliveryService {
        &mut self.delivery
    }

    /// Take all events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Start a new session over `plan`. Fails if one is already active.
    pub fn start_session(&mut self, plan: Vec<ExercisePlan>) -> Result<Uuid, SessionError> {
        if self.status != SessionStatus::Idle {
            return Err(SessionError::AlreadyActive);
        }
        let now = self.clock.now();
        let session_id = Uuid::new_v4();

        self.reset_accumulators();
        self.session_id = Some(session_id);
        self.started_at = Some(now);
        self.plan = plan;
        self.status = SessionStatus::Active;
        self.accepting_samples = true;
        self.last_calorie_poll_ms = self.clock.now_ms();

        let workout = self.timers.create(TimerKind::Workout, 0, None, None);
        if let Err(err) = self.timers.start(workout) {
            tracing::warn!(error = %err, "failed to start workout timer");
        }
        self.workout_timer = Some(workout);

        self.pending_events.push(SessionEvent::SessionStarted {
            session_id,
            at: now,
        });
        self.send_session_state();
        Ok(session_id)
    }

    /// Pause the session and every active timer.
    pub fn pause_session(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidState {
                expected: "active",
                actual: self.status,
            });
        }
        let now = self.clock.now();
        self.paused_since_ms = Some(self.clock.now_ms());
        self.resume_on_session_resume = self
            .timers
            .list_active()
            .into_iter()
            .filter(|t| t.state == crate::timer::TimerState::Running)
            .map(|t| t.id)
            .collect();
        for id in self.resume_on_session_resume.clone() {
            if let Err(err) = self.timers.pause(id) {
                tracing::warn!(timer = %id, error = %err, "failed to pause timer with session");
            }
        }
        self.status = SessionStatus::Paused;
        if let Some(snapshot) = self.workout_timer.and_then(|id| self.timers.get(id)) {
            self.delivery.send_timer_pause(snapshot);
        }
        self.pending_events
            .push(SessionEvent::SessionPaused { at: now });
        Ok(())
    }

    /// Resume a paused session. Paused time is excluded from elapsed.
    pub fn resume_session(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Paused {
            return Err(SessionError::InvalidState {
                expected: "paused",
                actual: self.status,
            });
        }
        let now = self.clock.now();
        if let Some(since) = self.paused_since_ms.take() {
            self.paused_accum_ms += self.clock.now_ms().saturating_sub(since);
        }
        for id in std::mem::take(&mut self.resume_on_session_resume) {
            if let Err(err) = self.timers.resume(id) {
                tracing::warn!(timer = %id, error = %err, "failed to resume timer with session");
            }
        }
        self.status = SessionStatus::Active;
        if let Some(snapshot) = self.workout_timer.and_then(|id| self.timers.get(id)) {
            self.delivery.send_timer_resume(snapshot);
        }
        self.pending_events
            .push(SessionEvent::SessionResumed { at: now });
        Ok(())
    }

    /// End the session and return the final summary.
    pub fn end_session(&mut self) -> Result<WorkoutSummary, SessionError> {
        if !matches!(self.status, SessionStatus::Active | SessionStatus::Paused) {
            return Err(SessionError::InvalidState {
                expected: "active or paused",
                actual: self.status,
            });
        }
        let now = self.clock.now();
        if let Some(since) = self.paused_since_ms.take() {
            self.paused_accum_ms += self.clock.now_ms().saturating_sub(since);
        }
        self.status = SessionStatus::Ending;
        self.accepting_samples = false;

        let merged = self.merge_background_samples();
        if merged > 0 {
            self.pending_events.push(SessionEvent::SamplesMerged {
                added: merged,
                at: now,
            });
        }
        self.in_background = false;

        // Close out every owned timer before summarizing.
        if let Some(id) = self.rest_timer.take() {
            self.close_countdown_timer(id);
        }
        if let Some(id) = self.exercise_timer.take() {
            self.close_countdown_timer(id);
        }
        let mut workout_elapsed_secs = 0;
        if let Some(id) = self.workout_timer.take() {
            if let Some(snapshot) = self.timers.get(id) {
                workout_elapsed_secs = snapshot.elapsed_secs;
                if !snapshot.state.is_terminal() {
                    if let Err(err) = self.timers.stop(id) {
                        tracing::warn!(timer = %id, error = %err, "failed to stop workout timer");
                    }
                }
            }
            self.timers.clear(id);
        }

        // The final milestone fires on end regardless of numeric progress.
        if self.milestones_fired.insert(100) {
            self.pending_events.push(SessionEvent::MilestoneReached {
                pct: 100,
                at: now,
            });
        }

        let session_id = self.session_id.unwrap_or_else(Uuid::new_v4);
        let started_at = self.started_at.unwrap_or(now);
        let exercises: Vec<_> = self
            .plan
            .iter()
            .filter_map(|entry| {
                let windows: Vec<TimerHealthWindow> = self
                    .windows
                    .iter()
                    .filter(|w| w.exercise_id.as_deref() == Some(entry.id.as_str()))
                    .cloned()
                    .collect();
                if windows.is_empty() && !self.completed_exercises.contains(&entry.id) {
                    return None;
                }
                Some(health::aggregate_exercise(&windows, &entry.id, &entry.name))
            })
            .collect();

        let summary = WorkoutSummary {
            session_id,
            started_at,
            ended_at: now,
            active_secs: workout_elapsed_secs,
            avg_bpm: health::mean_bpm(&self.samples),
            max_bpm: health::max_bpm(&self.samples),
            total_calories: self.calories,
            sets_completed: self.sets_completed,
            exercises,
        };

        recovery::clear(self.store.as_ref());
        let final_heart_rate = self.current_heart_rate();
        self.delivery.send_full_session_state(
            session_id,
            workout_elapsed_secs,
            self.calories,
            final_heart_rate,
            self.phase,
            self.progress_pct,
        );
        self.pending_events.push(SessionEvent::SessionEnded {
            session_id,
            at: now,
        });

        self.reset_accumulators();
        self.status = SessionStatus::Idle;
        Ok(summary)
    }

    // ── Exercise / set flow ──────────────────────────────────────────

    /// Begin an exercise from the plan.
    pub fn start_exercise(&mut self, exercise_id: &str) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidState {
                expected: "active",
                actual: self.status,
            });
        }
        let entry = self
            .plan
            .iter()
            .find(|e| e.id == exercise_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))?;
        let now = self.clock.now();

        // Any in-flight rest or previous exercise timer ends here.
        if let Some(id) = self.rest_timer.take() {
            self.close_countdown_timer(id);
        }
        if let Some(id) = self.exercise_timer.take() {
            self.close_countdown_timer(id);
        }

        if let Some(duration) = entry.suggested_duration_secs {
            let id = self.timers.create(
                TimerKind::Exercise,
                duration,
                Some(entry.id.clone()),
                None,
            );
            if let Err(err) = self.timers.start(id) {
                tracing::warn!(error = %err, "failed to start exercise timer");
            } else {
                self.open_windows.insert(id, now);
                self.exercise_timer = Some(id);
                if let Some(snapshot) = self.timers.get(id) {
                    self.delivery.send_timer_start(snapshot);
                }
            }
        }

        let new_phase = entry.muscle_group.phase();
        if new_phase != self.phase {
            self.phase = new_phase;
            self.delivery.send_phase_change(new_phase);
            self.pending_events.push(SessionEvent::PhaseChanged {
                phase: new_phase,
                at: now,
            });
        }

        self.current_set = 0;
        self.pending_events.push(SessionEvent::ExerciseStarted {
            exercise_id: entry.id.clone(),
            name: entry.name.clone(),
            at: now,
        });
        self.current_exercise = Some(entry);
        Ok(())
    }

    /// Complete a set of the current exercise, optionally overriding the
    /// rest duration.
    pub fn complete_set(&mut self, rest_override_secs: Option<u64>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidState {
                expected: "active",
                actual: self.status,
            });
        }
        let exercise = self
            .current_exercise
            .clone()
            .ok_or(SessionError::NoActiveExercise)?;
        let now = self.clock.now();
        let live_bpm = self.current_heart_rate();

        // Synthetic sample marking the completion moment.
        if let Some(bpm) = live_bpm {
            self.ingest_sample(HrSample::new(bpm, now, SampleSource::Host));
        }

        self.current_set += 1;
        self.sets_completed += 1;

        // A rest timer still running from the previous set ends now.
        if let Some(id) = self.rest_timer.take() {
            self.close_countdown_timer(id);
        }

        let mut rest_secs = None;
        if self.config.auto_rest {
            let secs =
                self.rest_policy
                    .choose(&exercise, self.current_set, rest_override_secs, live_bpm);
            let id = self.timers.create(
                TimerKind::Rest,
                secs,
                Some(exercise.id.clone()),
                Some(self.current_set),
            );
            if let Err(err) = self.timers.start(id) {
                tracing::warn!(error = %err, "failed to start rest timer");
            } else {
                self.open_windows.insert(id, now);
                self.rest_timer = Some(id);
                rest_secs = Some(secs);
                if let Some(snapshot) = self.timers.get(id) {
                    self.delivery.send_timer_start(snapshot);
                }
                self.pending_events.push(SessionEvent::RestTimerStarted {
                    timer_id: id,
                    duration_secs: secs,
                    at: now,
                });
            }
        }

        self.pending_events.push(SessionEvent::SetCompleted {
            exercise_id: exercise.id,
            set_index: self.current_set,
            rest_secs,
            at: now,
        });
        Ok(())
    }

    /// User adjusted the in-flight rest timer; feed the learned preference.
    pub fn adjust_rest_timer(&mut self, delta_secs: i64) -> Result<(), CoreError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidState {
                expected: "active",
                actual: self.status,
            }
            .into());
        }
        let id = match self.rest_timer {
            Some(id) => id,
            None => return Ok(()),
        };
        self.timers.adjust(id, delta_secs)?;
        if let Some(snapshot) = self.timers.get(id) {
            if let Some(exercise) = &self.current_exercise {
                self.rest_policy
                    .record_adjustment(&exercise.name, snapshot.duration_secs);
            }
            self.delivery.send_timer_state_update(snapshot);
        }
        Ok(())
    }

    /// Skip the in-flight rest timer.
    pub fn skip_rest(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidState {
                expected: "active",
                actual: self.status,
            });
        }
        if let Some(id) = self.rest_timer.take() {
            if let Some(snapshot) = self.timers.get(id) {
                self.delivery.send_timer_skip(snapshot);
            }
            self.close_countdown_timer(id);
        }
        Ok(())
    }

    /// Mark an exercise complete and recompute progress.
    ///
    /// Progress is monotonically non-decreasing even when exercises finish
    /// out of the planned order.
    pub fn complete_exercise(&mut self, exercise_id: &str) -> Result<u8, SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidState {
                expected: "active",
                actual: self.status,
            });
        }
        if !self.plan.iter().any(|e| e.id == exercise_id) {
            return Err(SessionError::UnknownExercise(exercise_id.to_string()));
        }
        let now = self.clock.now();
        self.completed_exercises.insert(exercise_id.to_string());

        if self
            .current_exercise
            .as_ref()
            .is_some_and(|e| e.id == exercise_id)
        {
            if let Some(id) = self.exercise_timer.take() {
                self.close_countdown_timer(id);
            }
            if let Some(id) = self.rest_timer.take() {
                self.close_countdown_timer(id);
            }
            self.current_exercise = None;
        }

        let total = self.plan.len();
        if total > 0 {
            let raw = (100.0 * self.completed_exercises.len() as f64 / total as f64).round();
            let candidate = (raw as i64).clamp(0, 100) as u8;
            if candidate > self.progress_pct {
                self.progress_pct = candidate;
            }
        }
        self.check_milestones(now);

        self.pending_events.push(SessionEvent::ExerciseCompleted {
            exercise_id: exercise_id.to_string(),
            progress_pct: self.progress_pct,
            at: now,
        });
        Ok(self.progress_pct)
    }

    fn check_milestones(&mut self, at: DateTime<Utc>) {
        for threshold in MILESTONES {
            if self.progress_pct >= threshold && self.milestones_fired.insert(threshold) {
                self.pending_events.push(SessionEvent::MilestoneReached {
                    pct: threshold,
                    at,
                });
                self.send_session_state();
            }
        }
    }

    // ── Samples & calories ───────────────────────────────────────────

    /// Record an externally-delivered heart-rate sample.
    ///
    /// While the app is backgrounded, samples go to a side buffer that is
    /// merged (deduplicated by timestamp) on foregrounding.
    pub fn ingest_sample(&mut self, sample: HrSample) {
        if !self.accepting_samples {
            return;
        }
        if self.in_background {
            self.background_buffer.push(sample);
        } else {
            self.samples.push(sample);
        }
    }

    /// Periodic update. Flushes timers, reaps completed countdowns, and
    /// refreshes the calorie estimate. Safe to call at any cadence.
    pub fn tick(&mut self) {
        if self.status != SessionStatus::Active {
            return;
        }
        let events = self.timers.tick_all();
        for event in events {
            if let TimerEvent::Completed { timer, .. } = event {
                if self.rest_timer == Some(timer.id) {
                    self.rest_timer = None;
                    self.delivery.send_timer_complete(timer.clone());
                    self.close_countdown_timer(timer.id);
                } else if self.exercise_timer == Some(timer.id) {
                    self.exercise_timer = None;
                    self.delivery.send_timer_complete(timer.clone());
                    self.close_countdown_timer(timer.id);
                }
            }
        }
        self.refresh_calories();
    }

    fn refresh_calories(&mut self) {
        let now_ms = self.clock.now_ms();
        if now_ms.saturating_sub(self.last_calorie_poll_ms)
            < self.config.calorie_refresh_secs * 1000
        {
            return;
        }
        self.last_calorie_poll_ms = now_ms;
        let Some(started_at) = self.started_at else {
            return;
        };
        let now = self.clock.now();
        match self.calorie_source.active_calories(started_at, now) {
            Some(total) if total > self.calories => {
                self.calories = total;
                self.pending_events.push(SessionEvent::CaloriesUpdated {
                    total,
                    at: now,
                });
            }
            // Decreases and unavailable reads are ignored; the counter is
            // monotone.
            _ => {}
        }
    }

    // ── Backgrounding & recovery ─────────────────────────────────────

    /// App moved to background: persist a recovery snapshot and start
    /// buffering incoming samples.
    pub fn enter_background(&mut self) {
        if !matches!(self.status, SessionStatus::Active | SessionStatus::Paused) {
            return;
        }
        self.persist_snapshot();
        self.in_background = true;
    }

    /// App returned to foreground: merge buffered samples into the main
    /// sequence, suppressing duplicate timestamps.
    pub fn enter_foreground(&mut self) {
        let added = self.merge_background_samples();
        self.in_background = false;
        if added > 0 {
            self.pending_events.push(SessionEvent::SamplesMerged {
                added,
                at: self.clock.now(),
            });
        }
    }

    fn merge_background_samples(&mut self) -> usize {
        if self.background_buffer.is_empty() {
            return 0;
        }
        let existing: HashSet<i64> = self.samples.iter().map(|s| s.at.timestamp_millis()).collect();
        let mut added = 0usize;
        let mut seen = existing;
        for sample in std::mem::take(&mut self.background_buffer) {
            if seen.insert(sample.at.timestamp_millis()) {
                self.samples.push(sample);
                added += 1;
            }
        }
        self.samples.sort_by_key(|s| s.at);
        added
    }

    /// Rehydrate a session persisted by a previous process, if one exists.
    /// Returns whether recovery happened. The session keeps its original id.
    pub fn recover(&mut self) -> bool {
        if self.status != SessionStatus::Idle {
            return false;
        }
        let Some(snapshot) = recovery::load(self.store.as_ref()) else {
            return false;
        };
        if !snapshot.active {
            recovery::clear(self.store.as_ref());
            return false;
        }

        self.session_id = Some(snapshot.session_id);
        self.started_at = Some(snapshot.started_at);
        self.paused_accum_ms = snapshot.paused_accum_ms;
        self.samples = snapshot.samples;
        self.calories = snapshot.calories;
        self.progress_pct = snapshot.progress_pct;
        self.milestones_fired = snapshot.milestones_fired.iter().copied().collect();
        self.completed_exercises = snapshot.completed_exercises.iter().cloned().collect();
        self.phase = snapshot.phase;
        self.status = SessionStatus::Active;
        self.accepting_samples = true;
        self.last_calorie_poll_ms = self.clock.now_ms();

        let workout = self.timers.create_with_elapsed(
            TimerKind::Workout,
            0,
            None,
            None,
            snapshot.workout_elapsed_ms,
        );
        if let Err(err) = self.timers.start(workout) {
            tracing::warn!(error = %err, "failed to restart recovered workout timer");
        }
        self.workout_timer = Some(workout);

        self.pending_events.push(SessionEvent::SessionStarted {
            session_id: snapshot.session_id,
            at: self.clock.now(),
        });
        true
    }

    fn persist_snapshot(&self) {
        let (Some(session_id), Some(started_at)) = (self.session_id, self.started_at) else {
            return;
        };
        let workout_elapsed_ms = self
            .workout_timer
            .and_then(|id| self.timers.get(id))
            .map(|s| s.elapsed_secs * 1000)
            .unwrap_or(0);
        let snapshot = SessionSnapshot {
            session_id,
            started_at,
            workout_elapsed_ms,
            paused_accum_ms: self.paused_accum_ms,
            samples: self.samples.clone(),
            calories: self.calories,
            progress_pct: self.progress_pct,
            milestones_fired: self.milestones_fired.iter().copied().collect(),
            completed_exercises: self.completed_exercises.iter().cloned().collect(),
            phase: self.phase,
            active: true,
            updated_at: self.clock.now(),
        };
        recovery::save(self.store.as_ref(), &snapshot);
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Record the health window for a countdown timer and remove it.
    fn close_countdown_timer(&mut self, id: Uuid) {
        if let Some(snapshot) = self.timers.get(id) {
            if let Some(start) = self.open_windows.remove(&id) {
                let end = self.clock.now();
                self.windows.push(health::window_metrics(
                    &self.samples,
                    id,
                    snapshot.kind,
                    start,
                    end,
                    snapshot.exercise_id.clone(),
                    snapshot.set_index,
                ));
            }
            if !snapshot.state.is_terminal() {
                if let Err(err) = self.timers.stop(id) {
                    tracing::warn!(timer = %id, error = %err, "failed to stop timer during close");
                }
            }
        }
        self.timers.clear(id);
        self.open_windows.remove(&id);
    }

    fn send_session_state(&mut self) {
        let (Some(session_id), Some(workout)) = (self.session_id, self.workout_timer) else {
            return;
        };
        let elapsed_secs = self
            .timers
            .get(workout)
            .map(|s| s.elapsed_secs)
            .unwrap_or(0);
        let heart_rate = self.current_heart_rate();
        self.delivery.send_full_session_state(
            session_id,
            elapsed_secs,
            self.calories,
            heart_rate,
            self.phase,
            self.progress_pct,
        );
    }

    fn reset_accumulators(&mut self) {
        self.session_id = None;
        self.started_at = None;
        self.phase = SessionPhase::Warmup;
        self.paused_accum_ms = 0;
        self.paused_since_ms = None;
        self.resume_on_session_resume.clear();
        self.samples.clear();
        self.background_buffer.clear();
        self.in_background = false;
        self.accepting_samples = false;
        self.calories = 0.0;
        self.last_calorie_poll_ms = 0;
        self.workout_timer = None;
        self.exercise_timer = None;
        self.rest_timer = None;
        self.open_windows.clear();
        self.windows.clear();
        self.plan.clear();
        self.current_exercise = None;
        self.current_set = 0;
        self.sets_completed = 0;
        self.completed_exercises.clear();
        self.progress_pct = 0;
        self.milestones_fired.clear();
    }
}
