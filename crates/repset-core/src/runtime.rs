//! Tokio-based periodic driver for the orchestrator.
//!
//! The orchestrator is thread-free and caller-ticked; this runtime owns it
//! behind a single mutex (single-writer discipline) and runs a ~100 ms
//! interval loop calling `tick()`. The cadence only affects display
//! smoothness; timer arithmetic is wall-clock based.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session::SessionOrchestrator;
use crate::sources::BiometricSource;
use crate::subscribers::SubscriptionId;

/// Fine-grained update cadence for smooth sub-second display.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Owns a [`SessionOrchestrator`] and drives its periodic updates.
pub struct SessionRuntime {
    inner: Arc<Mutex<SessionOrchestrator>>,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SessionRuntime {
    /// Spawn the tick loop on the current tokio runtime.
    pub fn spawn(orchestrator: SessionOrchestrator) -> Self {
        let inner = Arc::new(Mutex::new(orchestrator));
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let loop_inner = inner.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => {
                        loop_inner.lock().unwrap().tick();
                    }
                }
            }
        });
        Self {
            inner,
            stop_tx,
            handle,
        }
    }

    /// Shared handle for issuing commands to the orchestrator.
    pub fn orchestrator(&self) -> Arc<Mutex<SessionOrchestrator>> {
        self.inner.clone()
    }

    /// Run `f` against the orchestrator under the runtime's lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut SessionOrchestrator) -> R) -> R {
        let mut guard = self.inner.lock().unwrap();
        f(&mut guard)
    }

    /// Wire a biometric source into the orchestrator. Returns the source's
    /// subscription handle for later unsubscribe.
    pub fn attach_biometrics(&self, source: &dyn BiometricSource) -> SubscriptionId {
        let inner = self.inner.clone();
        source.subscribe(Box::new(move |sample| {
            inner.lock().unwrap().ingest_sample(sample);
        }))
    }

    /// Stop the tick loop. No further ticks run after this returns.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::connectivity::Transport;
    use crate::error::TransportError;
    use crate::session::{SessionConfig, SessionStatus};
    use crate::sources::FixedRateCalorieSource;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    struct NullTransport;

    impl Transport for NullTransport {
        fn send_raw(
            &self,
            _message: &crate::connectivity::CompanionMessage,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn orchestrator() -> SessionOrchestrator {
        SessionOrchestrator::new(
            Arc::new(SystemClock),
            Arc::new(MemoryStore::new()),
            Arc::new(FixedRateCalorieSource {
                calories_per_minute: 5.0,
            }),
            Arc::new(NullTransport),
            SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn ticks_run_until_shutdown() {
        let runtime = SessionRuntime::spawn(orchestrator());
        runtime.with(|o| {
            o.start_session(Vec::new()).unwrap();
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        let status = runtime.with(|o| o.status());
        assert_eq!(status, SessionStatus::Active);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn commands_work_through_the_shared_handle() {
        let runtime = SessionRuntime::spawn(orchestrator());
        let shared = runtime.orchestrator();
        shared.lock().unwrap().start_session(Vec::new()).unwrap();
        shared.lock().unwrap().pause_session().unwrap();
        assert_eq!(
            shared.lock().unwrap().status(),
            SessionStatus::Paused
        );
        runtime.shutdown().await;
    }
}
