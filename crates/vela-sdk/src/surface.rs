//! Surface boundary: presentation units bound to a script context.

use crate::context::ContextHandle;
use crate::fault::SurfaceFault;

/// Identifier assigned to a surface by the context it is bound to.
///
/// Valid only for the binding that produced it; a surface re-bound after a
/// context switch receives a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// A presentation unit that renders content produced by a script context.
///
/// The host calls `bind` → `run_entry_point` → `notify_bound`, in that order,
/// when attaching the surface to a context, and only `unbind` when detaching.
/// A surface stays a member of the host's attachment set across context
/// switches and is re-bound to each newly published context.
///
/// Implementations must not call back into the host from these methods.
pub trait Surface: Send + Sync {
    /// Register the surface with a context. Returns the id the context
    /// assigned to it.
    fn bind(&self, context: &ContextHandle) -> Result<SurfaceId, SurfaceFault>;

    /// Start the surface's program entry point on the bound context.
    fn run_entry_point(&self) -> Result<(), SurfaceFault>;

    /// Remove the surface's content from the context it is bound to.
    fn unbind(&self, id: SurfaceId);

    /// The bind sequence completed; the surface may accept input.
    fn notify_bound(&self);
}
