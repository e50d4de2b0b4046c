//! Memory-pressure fan-out.
//!
//! The host registers each published context here and unregisters it on
//! teardown; the embedder forwards platform pressure signals through
//! `notify`, from any thread.

use std::sync::Arc;

use parking_lot::Mutex;
use vela_sdk::{MemoryPressureLevel, MemoryPressureListener};

/// Multicast router for host memory-pressure signals.
#[derive(Default)]
pub struct MemoryPressureRouter {
    listeners: Mutex<Vec<Arc<dyn MemoryPressureListener>>>,
}

impl MemoryPressureRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a listener. No-op if it is already registered.
    pub fn add_listener(&self, listener: Arc<dyn MemoryPressureListener>) {
        let mut listeners = self.listeners.lock();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregister a listener. No-op if it is absent.
    pub fn remove_listener(&self, listener: &Arc<dyn MemoryPressureListener>) {
        self.listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Forward a pressure signal to every registered listener.
    /// Safe from any thread; the lock is not held across callbacks.
    pub fn notify(&self, level: MemoryPressureLevel) {
        log::debug!("memory pressure: {:?}", level);
        let snapshot: Vec<_> = self.listeners.lock().clone();
        for listener in snapshot {
            listener.on_memory_pressure(level);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl MemoryPressureListener for Counting {
        fn on_memory_pressure(&self, _level: MemoryPressureLevel) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_notify_remove() {
        let router = MemoryPressureRouter::new();
        let listener = Arc::new(Counting(AtomicUsize::new(0)));
        let as_dyn: Arc<dyn MemoryPressureListener> = listener.clone();

        router.add_listener(as_dyn.clone());
        router.add_listener(as_dyn.clone());
        assert_eq!(router.len(), 1);

        router.notify(MemoryPressureLevel::Moderate);
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);

        router.remove_listener(&as_dyn);
        router.notify(MemoryPressureLevel::Critical);
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);
        assert_eq!(router.len(), 0);
    }
}
