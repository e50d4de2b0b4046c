//! Context-ready listener registry.
//!
//! Multicast of "context ready" notifications. Add and remove are safe from
//! any thread and from within a listener's own callback: the lock is never
//! held across a callback. Notification snapshots the set first, then checks
//! membership per listener, so listeners added during a notification are not
//! invoked for it and listeners removed before their turn are skipped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use vela_sdk::{ContextHandle, ContextReadyListener};

/// Token identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Thread-safe set of context-ready listeners.
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: Mutex<HashMap<u64, Arc<dyn ContextReadyListener>>>,
    next_id: AtomicU64,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its removal token.
    pub(crate) fn add(&self, listener: Arc<dyn ContextReadyListener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, listener);
        ListenerId(id)
    }

    /// Remove a listener. Returns false if the token was already removed.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.listeners.lock().remove(&id.0).is_some()
    }

    /// Notify all listeners registered at the start of the call.
    pub(crate) fn notify_ready(&self, context: &ContextHandle) {
        let snapshot: Vec<(u64, Arc<dyn ContextReadyListener>)> = {
            let listeners = self.listeners.lock();
            let mut pairs: Vec<_> = listeners
                .iter()
                .map(|(id, listener)| (*id, listener.clone()))
                .collect();
            pairs.sort_by_key(|(id, _)| *id);
            pairs
        };

        for (id, listener) in snapshot {
            // Skip listeners removed since the snapshot was taken.
            if !self.listeners.lock().contains_key(&id) {
                continue;
            }
            listener.on_context_ready(context);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().len()
    }
}
