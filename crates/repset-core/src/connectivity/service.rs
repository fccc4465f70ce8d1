//! Delivery queue with FIFO ordering, retry, and state-change dedup.

use std::collections::VecDeque;
use std::sync::Arc;

use uuid::Uuid;

use super::types::{
    CompanionMessage, ConnectionState, QueuedMessage, RemoteTimerState, Transport,
};
use crate::clock::Clock;
use crate::session::SessionPhase;
use crate::storage::KvStore;
use crate::subscribers::{SubscriptionId, Subscribers};
use crate::timer::TimerSnapshot;

/// Store key for the persisted backlog.
const BACKLOG_KEY: &str = "delivery/backlog";

/// Consecutive head failures before a message is moved to the tail.
const MAX_HEAD_RETRIES: u32 = 3;

/// Reliable, ordered message delivery to the companion device.
///
/// `send` never surfaces transport errors: a message that cannot go out
/// immediately is queued, persisted, and retried when reachability returns.
pub struct DeliveryService {
    transport: Arc<dyn Transport>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    state: ConnectionState,
    queue: VecDeque<QueuedMessage>,
    state_subs: Subscribers<ConnectionState>,
    message_subs: Subscribers<CompanionMessage>,
    remote_timer: Option<RemoteTimerState>,
}

impl DeliveryService {
    /// Create a service, restoring any backlog persisted by a previous run.
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let queue = load_backlog(store.as_ref());
        Self {
            transport,
            store,
            clock,
            state: ConnectionState::default(),
            queue,
            state_subs: Subscribers::new(),
            message_subs: Subscribers::new(),
            remote_timer: None,
        }
    }

    // ── Outbound ─────────────────────────────────────────────────────

    /// Send a message, queuing it if the companion is unreachable or the
    /// transport call fails. Infallible from the caller's point of view.
    pub fn send(&mut self, message: CompanionMessage) {
        if !self.state.reachable {
            self.enqueue(message);
            return;
        }
        if let Err(err) = self.transport.send_raw(&message) {
            tracing::debug!(error = %err, "immediate transmit failed; queuing message");
            self.enqueue(message);
        }
    }

    fn enqueue(&mut self, message: CompanionMessage) {
        self.queue.push_back(QueuedMessage {
            id: Uuid::new_v4(),
            message,
            enqueued_at: self.clock.now(),
            retry_count: 0,
        });
        self.persist_backlog();
    }

    /// Drain the queue in FIFO order while the companion stays reachable.
    ///
    /// A head message that fails `MAX_HEAD_RETRIES` times in a row is moved
    /// to the tail so it cannot starve the rest of the queue; it is never
    /// dropped. The pass ends once every originally-queued message has
    /// either been delivered or rotated once.
    fn drain(&mut self) {
        let budget = self.queue.len();
        let mut rotations = 0usize;
        while self.state.reachable && !self.queue.is_empty() {
            let head = match self.queue.front_mut() {
                Some(head) => head,
                None => break,
            };
            match self.transport.send_raw(&head.message) {
                Ok(()) => {
                    self.queue.pop_front();
                }
                Err(err) => {
                    head.retry_count += 1;
                    tracing::debug!(
                        error = %err,
                        retries = head.retry_count,
                        "queued transmit failed"
                    );
                    if head.retry_count % MAX_HEAD_RETRIES == 0 {
                        if let Some(stuck) = self.queue.pop_front() {
                            self.queue.push_back(stuck);
                        }
                        rotations += 1;
                        if rotations >= budget {
                            break;
                        }
                    }
                }
            }
        }
        self.persist_backlog();
    }

    fn persist_backlog(&self) {
        let bytes = match serde_json::to_vec(&self.queue) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize delivery backlog");
                return;
            }
        };
        if let Err(err) = self.store.set(BACKLOG_KEY, &bytes) {
            tracing::warn!(error = %err, "failed to persist delivery backlog; keeping it in memory");
        }
    }

    // ── Reachability ─────────────────────────────────────────────────

    /// Record a new connection-state observation from the external
    /// notifier. Identical consecutive observations are suppressed; a
    /// false-to-true reachability transition triggers a drain pass.
    pub fn observe_connection_state(&mut self, observed: ConnectionState) {
        if observed == self.state {
            return;
        }
        let became_reachable = !self.state.reachable && observed.reachable;
        self.state = observed;
        self.state_subs.notify(&observed);
        if became_reachable {
            self.drain();
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to connection-state changes. The current state is
    /// delivered immediately; subsequent states only when they differ from
    /// the previously observed one.
    pub fn subscribe_to_state_changes(
        &mut self,
        callback: Box<dyn Fn(&ConnectionState) + Send>,
    ) -> SubscriptionId {
        callback(&self.state);
        self.state_subs.insert(callback)
    }

    /// Subscribe to inbound companion messages. No delivery guarantee
    /// beyond what the peer itself provides.
    pub fn subscribe_to_messages(
        &mut self,
        callback: Box<dyn Fn(&CompanionMessage) + Send>,
    ) -> SubscriptionId {
        self.message_subs.insert(callback)
    }

    /// Remove a subscription. Synchronous: no callback runs after this
    /// returns.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state_subs.remove(id) || self.message_subs.remove(id)
    }

    /// Fan an inbound message out to all current subscribers.
    pub fn receive(&mut self, message: CompanionMessage) {
        self.message_subs.notify(&message);
    }

    // ── Timer convenience sends ──────────────────────────────────────

    pub fn send_timer_start(&mut self, timer: TimerSnapshot) {
        self.mirror(&timer);
        self.send(CompanionMessage::TimerStart { timer });
    }

    pub fn send_timer_pause(&mut self, timer: TimerSnapshot) {
        self.mirror(&timer);
        self.send(CompanionMessage::TimerPause { timer });
    }

    pub fn send_timer_resume(&mut self, timer: TimerSnapshot) {
        self.mirror(&timer);
        self.send(CompanionMessage::TimerResume { timer });
    }

    pub fn send_timer_complete(&mut self, timer: TimerSnapshot) {
        self.mirror(&timer);
        self.send(CompanionMessage::TimerComplete { timer });
    }

    pub fn send_timer_skip(&mut self, timer: TimerSnapshot) {
        self.mirror(&timer);
        self.send(CompanionMessage::TimerSkip { timer });
    }

    pub fn send_timer_state_update(&mut self, timer: TimerSnapshot) {
        self.mirror(&timer);
        self.send(CompanionMessage::TimerStateUpdate { timer });
    }

    pub fn send_phase_change(&mut self, phase: SessionPhase) {
        self.send(CompanionMessage::PhaseChange { phase });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_full_session_state(
        &mut self,
        session_id: Uuid,
        elapsed_secs: u64,
        calories: f64,
        heart_rate: Option<u32>,
        phase: SessionPhase,
        progress_pct: u8,
    ) {
        self.send(CompanionMessage::FullSessionState {
            session_id,
            elapsed_secs,
            calories,
            heart_rate,
            phase,
            progress_pct,
        });
    }

    /// Best-known state of the companion's timer, without a round trip.
    pub fn last_known_remote_timer(&self) -> Option<&RemoteTimerState> {
        self.remote_timer.as_ref()
    }

    fn mirror(&mut self, timer: &TimerSnapshot) {
        self.remote_timer = Some(RemoteTimerState {
            timer: timer.clone(),
            updated_at: self.clock.now(),
        });
    }
}

fn load_backlog(store: &dyn KvStore) -> VecDeque<QueuedMessage> {
    let bytes = match store.get(BACKLOG_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return VecDeque::new(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read delivery backlog; starting empty");
            return VecDeque::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(queue) => queue,
        Err(err) => {
            tracing::warn!(error = %err, "delivery backlog is corrupt; starting empty");
            VecDeque::new()
        }
    }
}
