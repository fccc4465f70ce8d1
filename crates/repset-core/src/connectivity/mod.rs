//! Companion-device connectivity layer.
//!
//! Best-effort reliable delivery of discrete messages to a loosely-connected
//! companion device over an unreliable transport: FIFO queuing while
//! unreachable, bounded head retries with move-to-tail, deduplicated
//! connection-state notification, and a persisted backlog that survives
//! restarts.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_tests;

pub use service::DeliveryService;
pub use types::{
    CompanionMessage, ConnectionState, QueuedMessage, RemoteTimerState, Transport,
};
