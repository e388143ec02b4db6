//! # Context Hub
//!
//! The substrate shared by every execution context of one process: a
//! broadcast channel for sync notifications and a registry of named locks.
//!
//! Several coordinators (one per context) hold the same `Arc<ContextHub>`.
//! The named lock for the durable blob path guarantees at most one flush at
//! a time across all of them. Locks are process-scoped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use stratum_core::StratumError;
use tokio::sync::{OwnedMutexGuard, broadcast};

/// Default capacity of the sync broadcast channel.
pub const EVENT_CAPACITY: usize = 64;

// =============================================================================
// SYNC EVENTS
// =============================================================================

/// A flush notification, serialized as `{"type": ..., "writerId": ..., "size"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SyncEvent {
    /// A context began flushing.
    SyncStart { writer_id: String },
    /// A context finished writing the blob and its metadata.
    SyncComplete { writer_id: String, size: u64 },
}

impl SyncEvent {
    /// The context that emitted the event.
    #[must_use]
    pub fn writer_id(&self) -> &str {
        match self {
            SyncEvent::SyncStart { writer_id } | SyncEvent::SyncComplete { writer_id, .. } => {
                writer_id
            }
        }
    }
}

// =============================================================================
// NAMED LOCKS
// =============================================================================

/// Registry of async mutexes keyed by name.
#[derive(Debug, Default)]
pub struct NamedLocks {
    locks: Mutex<BTreeMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl NamedLocks {
    /// Acquire the lock called `name`, waiting for any current holder.
    pub async fn acquire(&self, name: &str) -> Result<OwnedMutexGuard<()>, StratumError> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| StratumError::LockPoisoned("named locks"))?;
            locks.entry(name.to_string()).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Whether the lock called `name` is currently held.
    #[must_use]
    pub fn is_held(&self, name: &str) -> bool {
        self.locks
            .lock()
            .ok()
            .and_then(|locks| locks.get(name).map(|l| l.try_lock().is_err()))
            .unwrap_or(false)
    }
}

// =============================================================================
// HUB
// =============================================================================

/// Broadcast channel plus named locks.
#[derive(Debug)]
pub struct ContextHub {
    events: broadcast::Sender<SyncEvent>,
    locks: NamedLocks,
}

impl Default for ContextHub {
    fn default() -> Self {
        Self::new(EVENT_CAPACITY)
    }
}

impl ContextHub {
    /// Create a hub whose channel buffers up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            events,
            locks: NamedLocks::default(),
        }
    }

    /// Subscribe to sync events from every context.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Publish an event. Returns how many receivers saw it.
    pub fn publish(&self, event: SyncEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// The named lock registry.
    #[must_use]
    pub fn locks(&self) -> &NamedLocks {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_shape() {
        let start = serde_json::to_value(SyncEvent::SyncStart {
            writer_id: "ctx-1".to_string(),
        })
        .expect("encode");
        assert_eq!(
            start,
            serde_json::json!({"type": "sync-start", "writerId": "ctx-1"})
        );

        let complete = serde_json::to_value(SyncEvent::SyncComplete {
            writer_id: "ctx-1".to_string(),
            size: 42,
        })
        .expect("encode");
        assert_eq!(
            complete,
            serde_json::json!({"type": "sync-complete", "writerId": "ctx-1", "size": 42})
        );
    }

    #[test]
    fn publish_without_receivers_is_harmless() {
        let hub = ContextHub::default();
        assert_eq!(
            hub.publish(SyncEvent::SyncStart {
                writer_id: "a".to_string()
            }),
            0
        );
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let hub = ContextHub::default();
        let mut rx = hub.subscribe();
        hub.publish(SyncEvent::SyncStart {
            writer_id: "a".to_string(),
        });

        let event = rx.recv().await.expect("event");
        assert_eq!(event.writer_id(), "a");
    }

    #[tokio::test]
    async fn named_lock_is_exclusive() {
        let hub = Arc::new(ContextHub::default());
        let guard = hub.locks().acquire("stratum.db").await.expect("acquire");
        assert!(hub.locks().is_held("stratum.db"));
        assert!(!hub.locks().is_held("other"));

        let waiter = {
            let hub = hub.clone();
            tokio::spawn(async move {
                let _guard = hub.locks().acquire("stratum.db").await.expect("acquire");
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.expect("join");
        assert!(!hub.locks().is_held("stratum.db"));
    }
}
