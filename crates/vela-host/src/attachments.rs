//! Attachment set: the surfaces associated with the host.
//!
//! Membership is independent of context churn: surfaces attach and detach
//! whether or not a context exists or a build is in flight. Identity is the
//! `Arc` pointer, matching the reference-identity membership of the original
//! surface list.

use std::sync::Arc;

use parking_lot::Mutex;
use vela_sdk::{ContextHandle, FaultHandler, Surface, SurfaceId};

struct Attachment {
    surface: Arc<dyn Surface>,
    bound: Option<SurfaceId>,
}

/// Thread-safe, membership-unique set of surfaces with their live bindings.
#[derive(Default)]
pub(crate) struct AttachmentSet {
    slots: Mutex<Vec<Attachment>>,
}

impl AttachmentSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a surface. Returns false (no-op) if it is already attached.
    pub(crate) fn add(&self, surface: Arc<dyn Surface>) -> bool {
        let mut slots = self.slots.lock();
        if slots.iter().any(|slot| Arc::ptr_eq(&slot.surface, &surface)) {
            return false;
        }
        slots.push(Attachment {
            surface,
            bound: None,
        });
        true
    }

    /// Remove a surface, unbinding it first if it has a live binding.
    /// Returns false (no-op) if the surface was not attached.
    pub(crate) fn remove(&self, surface: &Arc<dyn Surface>) -> bool {
        let mut slots = self.slots.lock();
        let Some(index) = slots
            .iter()
            .position(|slot| Arc::ptr_eq(&slot.surface, surface))
        else {
            return false;
        };
        let slot = slots.remove(index);
        if let Some(id) = slot.bound {
            slot.surface.unbind(id);
        }
        true
    }

    /// Bind a single surface to a context if it is attached and unbound.
    pub(crate) fn bind_one(
        &self,
        surface: &Arc<dyn Surface>,
        context: &ContextHandle,
        faults: &Arc<dyn FaultHandler>,
    ) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots
            .iter_mut()
            .find(|slot| Arc::ptr_eq(&slot.surface, surface))
        {
            bind_slot(slot, context, faults);
        }
    }

    /// Replay attachment for every surface still present. Surfaces detached
    /// mid-build are simply absent by now and skipped; a failing surface is
    /// reported and does not stop the rest.
    pub(crate) fn bind_all(&self, context: &ContextHandle, faults: &Arc<dyn FaultHandler>) {
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            bind_slot(slot, context, faults);
        }
    }

    /// Detach-notify every bound surface without removing it from the set.
    /// Used when tearing down the context a binding points at.
    pub(crate) fn unbind_all(&self) {
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            if let Some(id) = slot.bound.take() {
                slot.surface.unbind(id);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

fn bind_slot(slot: &mut Attachment, context: &ContextHandle, faults: &Arc<dyn FaultHandler>) {
    if slot.bound.is_some() {
        return;
    }
    match slot.surface.bind(context) {
        Ok(id) => {
            slot.bound = Some(id);
            match slot.surface.run_entry_point() {
                Ok(()) => slot.surface.notify_bound(),
                Err(fault) => {
                    log::warn!("{}: surface entry point failed: {}", context.id(), fault);
                    faults.handle(fault.into());
                }
            }
        }
        Err(fault) => {
            log::warn!("{}: surface bind failed: {}", context.id(), fault);
            faults.handle(fault.into());
        }
    }
}
