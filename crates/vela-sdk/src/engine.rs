//! Engine boundary: the opaque scripting engine and its creation strategy.

use std::sync::Arc;

use crate::bundle::BundleSource;
use crate::capability::CapabilityRegistry;
use crate::fault::EngineFault;

/// Host memory-pressure signal forwarded to interested listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressureLevel {
    /// The host is under moderate pressure; caches should shrink.
    Moderate,
    /// The host is close to being killed; drop everything droppable.
    Critical,
}

/// Receiver of host memory-pressure signals.
pub trait MemoryPressureListener: Send + Sync {
    /// Called on an unspecified thread when the host reports pressure.
    fn on_memory_pressure(&self, level: MemoryPressureLevel);
}

/// A live scripting engine instance.
///
/// The host treats the engine as opaque: it is created by an
/// [`EngineStrategy`], told to run a bundle, notified of host lifecycle and
/// memory-pressure transitions, and destroyed exactly once. Implementations
/// use interior mutability; all methods take `&self` and may be called from
/// the host's worker or UI executor.
///
/// Engine callbacks must not reenter the host's public API.
pub trait ScriptEngine: Send + Sync {
    /// Initialize the call bridge. Called exactly once, at publish time,
    /// before any surface is bound.
    fn initialize_bridge(&self) -> Result<(), EngineFault>;

    /// Parse and execute the program bundle's entry point. Long-running;
    /// always invoked off the UI executor.
    fn run_bundle(&self, bundle: &BundleSource) -> Result<(), EngineFault>;

    /// Host moved to the foreground.
    fn on_resume(&self) {}

    /// Host moved to the background.
    fn on_pause(&self) {}

    /// Host is tearing down while this engine is still current.
    fn on_host_destroy(&self) {}

    /// Host reported memory pressure.
    fn on_memory_pressure(&self, _level: MemoryPressureLevel) {}

    /// Release the engine's resources. Called exactly once.
    fn destroy(&self);
}

/// Factory for scripting engines, the recreate request's "executor strategy".
///
/// `create` runs on the per-build worker thread and must not spawn long-lived
/// threads beyond what the engine itself requires.
pub trait EngineStrategy: Send + Sync {
    /// Create a fresh engine wired to the given capability registry.
    fn create(
        &self,
        registry: Arc<CapabilityRegistry>,
    ) -> Result<Box<dyn ScriptEngine>, EngineFault>;
}
