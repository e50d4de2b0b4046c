//! Context factory: off-UI construction of a fully populated script context.
//!
//! Build order: fold provider packages into the capability registry, create
//! the engine via the request's strategy, assemble the context, run the
//! bundle entry point. Bridge initialization is deferred to publish time.

use std::sync::Arc;

use vela_sdk::{BundleSource, EngineStrategy, HostFault, ProviderPackage};

use crate::context::ScriptContext;
use crate::registry;

/// Build a new script context for the given strategy and bundle.
///
/// Runs on the per-build worker thread; spawns nothing beyond the context's
/// own internal executors. Faults are returned, not reported; routing to
/// the fault handler is the coordinator's job.
pub fn build_context(
    strategy: &Arc<dyn EngineStrategy>,
    bundle: &BundleSource,
    packages: &[ProviderPackage],
) -> Result<ScriptContext, HostFault> {
    log::debug!("build_context: start ('{}')", bundle.display_name());

    let registry = Arc::new(registry::build_registry(packages)?);

    log::debug!("build_context: creating engine");
    let engine = strategy.create(registry.clone())?;

    let context = ScriptContext::new(engine, registry);

    log::debug!("build_context: running bundle");
    if let Err(fault) = context.run_bundle(bundle) {
        // The half-built context must not leak its engine or executors.
        context.destroy();
        return Err(fault.into());
    }

    log::debug!("build_context: done ({})", context.id());
    Ok(context)
}
