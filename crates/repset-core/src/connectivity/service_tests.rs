use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::service::DeliveryService;
use super::types::{CompanionMessage, ConnectionState, Transport};
use crate::clock::SystemClock;
use crate::error::TransportError;
use crate::session::SessionPhase;
use crate::storage::{KvStore, MemoryStore};
use crate::timer::{TimerKind, TimerSnapshot, TimerState};

/// Transport that records what it sends and can be told to fail.
#[derive(Default)]
struct MockTransport {
    sent: Mutex<Vec<CompanionMessage>>,
    fail_all: AtomicBool,
    /// Fail only TimerSkip messages (the "stuck message" in queue tests).
    fail_skip: AtomicBool,
}

impl MockTransport {
    fn sent(&self) -> Vec<CompanionMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn send_raw(&self, message: &CompanionMessage) -> Result<(), TransportError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("mock failure".into()));
        }
        if self.fail_skip.load(Ordering::SeqCst)
            && matches!(message, CompanionMessage::TimerSkip { .. })
        {
            return Err(TransportError::SendFailed("mock skip failure".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn service() -> (DeliveryService, Arc<MockTransport>, Arc<MemoryStore>) {
    let transport = Arc::new(MockTransport::default());
    let store = Arc::new(MemoryStore::new());
    let service = DeliveryService::new(
        transport.clone(),
        store.clone() as Arc<dyn KvStore>,
        Arc::new(SystemClock),
    );
    (service, transport, store)
}

fn reachable() -> ConnectionState {
    ConnectionState {
        paired: true,
        reachable: true,
        companion_app_installed: true,
    }
}

fn unreachable() -> ConnectionState {
    ConnectionState {
        paired: true,
        reachable: false,
        companion_app_installed: true,
    }
}

fn snapshot(state: TimerState) -> TimerSnapshot {
    TimerSnapshot {
        id: Uuid::new_v4(),
        kind: TimerKind::Rest,
        state,
        duration_secs: 60,
        elapsed_secs: 0,
        remaining_secs: 60,
        exercise_id: None,
        set_index: None,
    }
}

fn full_state(progress_pct: u8) -> CompanionMessage {
    CompanionMessage::FullSessionState {
        session_id: Uuid::new_v4(),
        elapsed_secs: 0,
        calories: 0.0,
        heart_rate: None,
        phase: SessionPhase::Strength,
        progress_pct,
    }
}

fn progress_of(message: &CompanionMessage) -> u8 {
    match message {
        CompanionMessage::FullSessionState { progress_pct, .. } => *progress_pct,
        _ => panic!("expected FullSessionState"),
    }
}

#[test]
fn messages_sent_while_unreachable_are_queued_then_delivered_fifo() {
    let (mut service, transport, _store) = service();

    service.send(full_state(1));
    service.send(full_state(2));
    service.send(full_state(3));
    assert_eq!(service.pending_count(), 3);
    assert!(transport.sent().is_empty());

    service.observe_connection_state(reachable());

    let sent = transport.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(progress_of(&sent[0]), 1);
    assert_eq!(progress_of(&sent[1]), 2);
    assert_eq!(progress_of(&sent[2]), 3);
    assert_eq!(service.pending_count(), 0);
}

#[test]
fn reachable_sends_go_straight_through() {
    let (mut service, transport, _store) = service();
    service.observe_connection_state(reachable());

    service.send(full_state(42));
    assert_eq!(service.pending_count(), 0);
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn transport_failure_queues_instead_of_erroring() {
    let (mut service, transport, _store) = service();
    service.observe_connection_state(reachable());
    transport.fail_all.store(true, Ordering::SeqCst);

    service.send(full_state(5));
    assert_eq!(service.pending_count(), 1);

    transport.fail_all.store(false, Ordering::SeqCst);
    // Reachability dropping and returning triggers the retry.
    service.observe_connection_state(unreachable());
    service.observe_connection_state(reachable());
    assert_eq!(service.pending_count(), 0);
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn stuck_head_rotates_to_tail_without_starving_the_queue() {
    let (mut service, transport, _store) = service();
    transport.fail_skip.store(true, Ordering::SeqCst);

    service.send(CompanionMessage::TimerSkip {
        timer: snapshot(TimerState::Stopped),
    });
    service.send(full_state(1));
    service.send(full_state(2));

    service.observe_connection_state(reachable());

    // The two healthy messages got through, in order, despite the stuck head.
    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(progress_of(&sent[0]), 1);
    assert_eq!(progress_of(&sent[1]), 2);

    // The stuck message is still queued, never dropped.
    assert_eq!(service.pending_count(), 1);

    // Once the transport recovers, the next reachability flip delivers it.
    transport.fail_skip.store(false, Ordering::SeqCst);
    service.observe_connection_state(unreachable());
    service.observe_connection_state(reachable());
    assert_eq!(service.pending_count(), 0);
    assert_eq!(transport.sent().len(), 3);
}

#[test]
fn identical_state_observations_are_suppressed() {
    let (mut service, _transport, _store) = service();
    let seen: Arc<Mutex<Vec<ConnectionState>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        service.subscribe_to_state_changes(Box::new(move |state| {
            seen.lock().unwrap().push(*state);
        }));
    }
    // Current state delivered immediately on subscribe.
    assert_eq!(seen.lock().unwrap().len(), 1);

    let s1 = unreachable();
    let s2 = reachable();
    service.observe_connection_state(s1);
    service.observe_connection_state(s1);
    service.observe_connection_state(s1);
    service.observe_connection_state(s2);

    let seen = seen.lock().unwrap();
    // Initial + S1 + S2: the two repeat S1 observations fired nothing.
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1], s1);
    assert_eq!(seen[2], s2);
}

#[test]
fn unsubscribed_callback_never_fires_again() {
    let (mut service, _transport, _store) = service();
    let seen: Arc<Mutex<Vec<ConnectionState>>> = Arc::new(Mutex::new(Vec::new()));
    let sub = {
        let seen = seen.clone();
        service.subscribe_to_state_changes(Box::new(move |state| {
            seen.lock().unwrap().push(*state);
        }))
    };
    assert!(service.unsubscribe(sub));
    service.observe_connection_state(reachable());
    assert_eq!(seen.lock().unwrap().len(), 1); // only the immediate delivery
}

#[test]
fn inbound_messages_fan_out_to_subscribers() {
    let (mut service, _transport, _store) = service();
    let count = Arc::new(Mutex::new(0usize));
    for _ in 0..2 {
        let count = count.clone();
        service.subscribe_to_messages(Box::new(move |_| {
            *count.lock().unwrap() += 1;
        }));
    }
    service.receive(full_state(9));
    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn backlog_survives_a_restart() {
    let transport = Arc::new(MockTransport::default());
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    let mut first = DeliveryService::new(transport.clone(), store.clone(), Arc::new(SystemClock));
    first.send(full_state(7));
    first.send(full_state(8));
    drop(first);

    let mut second = DeliveryService::new(transport.clone(), store, Arc::new(SystemClock));
    assert_eq!(second.pending_count(), 2);

    second.observe_connection_state(reachable());
    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(progress_of(&sent[0]), 7);
    assert_eq!(progress_of(&sent[1]), 8);
}

#[test]
fn convenience_sends_update_the_remote_mirror() {
    let (mut service, _transport, _store) = service();
    assert!(service.last_known_remote_timer().is_none());

    let snap = snapshot(TimerState::Running);
    service.send_timer_start(snap.clone());
    let mirror = service.last_known_remote_timer().unwrap();
    assert_eq!(mirror.timer.id, snap.id);
    assert_eq!(mirror.timer.state, TimerState::Running);

    let paused = TimerSnapshot {
        state: TimerState::Paused,
        ..snap
    };
    service.send_timer_pause(paused);
    assert_eq!(
        service.last_known_remote_timer().unwrap().timer.state,
        TimerState::Paused
    );
}
