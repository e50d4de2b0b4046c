//! ScriptContext: a live engine instance plus its capability registry.
//!
//! Created by the factory on the build worker, mutated only by the
//! coordinator (initialize, lifecycle propagation, destroy), destroyed
//! exactly once. A destroyed context is never republished.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use vela_sdk::{
    BundleSource, CapabilityRegistry, ContextHandle, ContextId, EngineFault, MemoryPressureLevel,
    MemoryPressureListener, ScriptEngine,
};

use crate::executor::TaskExecutor;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

fn allocate_context_id() -> ContextId {
    ContextId::from_raw(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// One script context: engine, registry, and the context's internal
/// executors (script-execution thread and capability-dispatch thread).
pub struct ScriptContext {
    id: ContextId,
    engine: Box<dyn ScriptEngine>,
    registry: Arc<CapabilityRegistry>,
    script_executor: TaskExecutor,
    capability_executor: TaskExecutor,
    initialized: AtomicBool,
    destroyed: AtomicBool,
}

impl ScriptContext {
    /// Assemble a context around a freshly created engine.
    pub(crate) fn new(engine: Box<dyn ScriptEngine>, registry: Arc<CapabilityRegistry>) -> Self {
        let id = allocate_context_id();
        Self {
            id,
            engine,
            registry,
            script_executor: TaskExecutor::new(format!("vela-script-{}", id.as_u64())),
            capability_executor: TaskExecutor::new(format!("vela-caps-{}", id.as_u64())),
            initialized: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    /// The context's identity.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// A cheap handle suitable for crossing the SDK boundary.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle::new(self.id, self.registry.clone())
    }

    /// The context's capability registry.
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Whether `destroy` has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Initialize the engine's call bridge. Exactly once per context.
    pub(crate) fn initialize(&self) -> Result<(), EngineFault> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            log::warn!("{}: initialize called twice, ignoring", self.id);
            return Ok(());
        }
        log::debug!("{}: initializing bridge", self.id);
        self.engine.initialize_bridge()
    }

    /// Execute the program bundle. Runs on the calling thread (the build
    /// worker); long-running by design.
    pub(crate) fn run_bundle(&self, bundle: &BundleSource) -> Result<(), EngineFault> {
        log::debug!("{}: running bundle '{}'", self.id, bundle.display_name());
        self.engine.run_bundle(bundle)
    }

    /// Propagate a foreground transition to the engine.
    pub(crate) fn on_host_resume(&self) {
        if !self.is_destroyed() {
            self.engine.on_resume();
        }
    }

    /// Propagate a background transition to the engine.
    pub(crate) fn on_host_pause(&self) {
        if !self.is_destroyed() {
            self.engine.on_pause();
        }
    }

    /// Propagate host teardown to the engine.
    pub(crate) fn on_host_destroy(&self) {
        if !self.is_destroyed() {
            self.engine.on_host_destroy();
        }
    }

    /// Run a task on the context's script-execution thread. Tasks must not
    /// call back into the host's UI-confined API.
    pub fn run_on_script_thread<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.script_executor.submit(task);
    }

    /// Run a task on the context's capability-dispatch thread. Tasks must
    /// not call back into the host's UI-confined API.
    pub fn run_on_capability_thread<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.capability_executor.submit(task);
    }

    /// Tear the context down: engine first, then the internal executors.
    /// Idempotent; only the first call has any effect.
    pub(crate) fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("{}: destroying", self.id);
        self.engine.destroy();
        self.script_executor.shutdown();
        self.capability_executor.shutdown();
    }
}

impl MemoryPressureListener for ScriptContext {
    fn on_memory_pressure(&self, level: MemoryPressureLevel) {
        if !self.is_destroyed() {
            self.engine.on_memory_pressure(level);
        }
    }
}

impl std::fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptContext")
            .field("id", &self.id)
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .field("destroyed", &self.destroyed.load(Ordering::Relaxed))
            .finish()
    }
}
