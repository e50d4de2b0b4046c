//! Fault taxonomy shared by the host and its collaborators.
//!
//! Programmer misuse (calling a UI-confined entry point off the UI executor,
//! double initial-create) is not represented here: the host fails fast with a
//! panic. These types cover the recoverable faults that flow to a
//! [`FaultHandler`].

/// Failure inside a capability handler or registry lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CapabilityError {
    /// No handler registered under the requested name.
    #[error("Unknown capability: {0}")]
    Unknown(String),

    /// The handler rejected the call.
    #[error("Capability call failed: {0}")]
    Invoke(String),
}

/// Failure raised by the scripting engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineFault {
    /// Engine creation failed.
    #[error("Engine creation failed: {0}")]
    Create(String),

    /// Bridge initialization failed.
    #[error("Bridge initialization failed: {0}")]
    Bridge(String),

    /// Bundle fetch, parse, or execution failed.
    #[error("Bundle execution failed: {0}")]
    Bundle(String),

    /// The engine observed a cancellation request mid-build.
    #[error("Engine build interrupted")]
    Interrupted,
}

/// Failure binding or starting a single surface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceFault {
    /// The surface could not register with the context (e.g. its backing
    /// widget is gone).
    #[error("Surface bind failed: {0}")]
    Bind(String),

    /// The surface's entry point failed to start.
    #[error("Surface entry point failed: {0}")]
    EntryPoint(String),
}

/// Failure folding provider packages into a capability registry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryFault {
    /// Two packages contributed the same capability name.
    #[error("Duplicate capability '{name}' contributed by package '{package}'")]
    DuplicateCapability {
        /// The colliding capability name.
        name: String,
        /// The package whose contribution collided.
        package: String,
    },
}

/// Top-level fault reported to the embedder's [`FaultHandler`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostFault {
    /// Context construction failed; no new context was published.
    #[error(transparent)]
    Build(#[from] EngineFault),

    /// The capability registry could not be built.
    #[error(transparent)]
    Registry(#[from] RegistryFault),

    /// A single surface failed to bind; publication of the remaining
    /// surfaces continued.
    #[error(transparent)]
    Surface(#[from] SurfaceFault),

    /// A destroy raced with an in-flight build. Swallowed by the host,
    /// never delivered to a fault handler.
    #[error("Context build cancelled")]
    Cancelled,
}

/// Receiver of recoverable faults. Fire-and-forget from the host's point of
/// view: the handler may retry, surface UI, or just log.
pub trait FaultHandler: Send + Sync {
    /// Handle a fault. Called from the worker or UI executor.
    fn handle(&self, fault: HostFault);
}
