//! Vela SDK - Lightweight SDK for embedding Vela and writing capability providers
//!
//! This crate provides the minimal types and traits needed to write capability
//! providers, presentation surfaces, and engine strategies without depending on
//! the full `vela-host` orchestration core.
//!
//! # Example
//!
//! ```ignore
//! use vela_sdk::{CapabilityDescriptor, CapabilityValue, ProviderPackage};
//!
//! fn clock_now(_args: &[CapabilityValue]) -> Result<CapabilityValue, vela_sdk::CapabilityError> {
//!     Ok(CapabilityValue::I64(0))
//! }
//!
//! let package = ProviderPackage::new("core")
//!     .with_capability(CapabilityDescriptor::new("clock.now", clock_now));
//! ```

#![warn(missing_docs)]

mod bundle;
mod capability;
mod context;
mod engine;
mod fault;
mod surface;

pub use bundle::BundleSource;
pub use capability::{
    CapabilityDescriptor, CapabilityFn, CapabilityRegistry, CapabilityValue, PackageHooks,
    ProviderPackage,
};
pub use context::{ContextHandle, ContextId, ContextReadyListener};
pub use engine::{EngineStrategy, MemoryPressureLevel, MemoryPressureListener, ScriptEngine};
pub use fault::{CapabilityError, EngineFault, FaultHandler, HostFault, RegistryFault, SurfaceFault};
pub use surface::{Surface, SurfaceId};
