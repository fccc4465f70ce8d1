//! # Repset Core Library
//!
//! Core business logic for the Repset workout tracker: the timer and
//! session orchestration engine behind the mobile UI. The UI layer is a
//! thin presentation shell over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine owning multiple
//!   concurrent countdown/count-up timers; the caller ticks it
//!   periodically
//! - **Health Correlation**: pure functions mapping heart-rate samples
//!   onto timer windows and rolling them up per exercise and per workout
//! - **Connectivity**: reliable FIFO message delivery to a loosely-
//!   connected companion device, with queuing, retry, and state-change
//!   dedup
//! - **Session Orchestrator**: composes the above into a workout session
//!   with progression, milestones, background buffering, and crash
//!   recovery
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: multi-timer state machine
//! - [`SessionOrchestrator`]: session lifecycle and exercise flow
//! - [`DeliveryService`]: companion message queue
//! - [`SessionRuntime`]: tokio loop driving periodic updates

pub mod clock;
pub mod connectivity;
pub mod error;
pub mod events;
pub mod health;
pub mod runtime;
pub mod session;
pub mod sources;
pub mod storage;
pub mod subscribers;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connectivity::{CompanionMessage, ConnectionState, DeliveryService, Transport};
pub use error::{CoreError, SessionError, StoreError, TimerError, TransportError};
pub use events::{SessionEvent, TimerEvent};
pub use health::{correlate, window_metrics, HrSample, SampleSource, TimerHealthWindow};
pub use runtime::SessionRuntime;
pub use session::{
    ExercisePlan, MuscleGroup, SessionConfig, SessionOrchestrator, SessionPhase, SessionStatus,
    WorkoutSummary,
};
pub use sources::{BiometricSource, CalorieSource};
pub use storage::{KvStore, MemoryStore, SqliteStore};
pub use subscribers::{SubscriptionId, Subscribers};
pub use timer::{TimerEngine, TimerKind, TimerSnapshot, TimerState};
