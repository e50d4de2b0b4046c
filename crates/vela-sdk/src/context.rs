//! Context identity and the handle exposed to surfaces and listeners.

use std::sync::Arc;

use crate::capability::{CapabilityRegistry, CapabilityValue};
use crate::fault::CapabilityError;

/// Unique identity of a script context for the lifetime of the process.
///
/// Identities are never reused: a destroyed context's id stays retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Construct an id from a raw value. Intended for the host's allocator.
    pub fn from_raw(raw: u64) -> Self {
        ContextId(raw)
    }

    /// The raw id value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Cheap, cloneable handle to a live script context.
///
/// This is what crosses the boundary to surfaces (at bind time) and ready
/// listeners (at publish time). It carries the context identity and read-only
/// access to the context's capability registry; the engine itself stays
/// opaque behind the host.
#[derive(Clone)]
pub struct ContextHandle {
    id: ContextId,
    registry: Arc<CapabilityRegistry>,
}

impl ContextHandle {
    /// Create a handle. Intended for the host.
    pub fn new(id: ContextId, registry: Arc<CapabilityRegistry>) -> Self {
        Self { id, registry }
    }

    /// The context's identity.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The context's capability registry.
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Invoke a named capability on this context's registry.
    pub fn invoke(
        &self,
        name: &str,
        args: &[CapabilityValue],
    ) -> Result<CapabilityValue, CapabilityError> {
        self.registry.invoke(name, args)
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle").field("id", &self.id).finish()
    }
}

/// Observer notified when a freshly built script context becomes current.
///
/// Listeners may be added and removed from any thread, including from within
/// their own callback.
pub trait ContextReadyListener: Send + Sync {
    /// Called once per publish with a handle to the newly current context.
    fn on_context_ready(&self, context: &ContextHandle);
}
