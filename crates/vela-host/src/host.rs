//! ScriptHost, the context switch coordinator.
//!
//! Owns the single "current context" slot, the pending-request slot, and the
//! in-flight worker handle, all behind one mutex together with the lifecycle
//! phase: every decision between "spawn a worker" and "coalesce into
//! pending" reads and writes them as a unit.
//!
//! Thread model: all mutating public entry points are confined to the host's
//! UI executor (enforced, panics on misuse). Context construction happens on
//! a fresh named worker thread per build, never a pool. The worker hands the
//! built context back to the UI executor (or, under
//! `setup_on_worker_thread`, to the context's capability thread) for the
//! publish-and-attach step, then the pending slot is drained on the UI
//! executor.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use vela_sdk::{
    BundleSource, ContextHandle, ContextReadyListener, EngineStrategy, FaultHandler,
    MemoryPressureListener, ProviderPackage, Surface,
};

use crate::attachments::AttachmentSet;
use crate::context::ScriptContext;
use crate::error::{self, LoggingFaultHandler};
use crate::executor::{self, TaskExecutor, ThreadPriority};
use crate::factory;
use crate::lifecycle::{self, LifecycleState};
use crate::listeners::{ListenerId, ListenerSet};
use crate::options::HostOptions;
use crate::pressure::MemoryPressureRouter;

/// An immutable (strategy, bundle) pair describing a desired next context.
#[derive(Clone)]
struct InitRequest {
    strategy: Arc<dyn EngineStrategy>,
    bundle: BundleSource,
}

/// Identifies the in-flight creation worker, if any. Its presence is the
/// coalescing gate: a live handle means "overwrite pending", not "spawn".
struct WorkerHandle {
    generation: u64,
    interrupt: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// The three control-flow slots plus the lifecycle phase, guarded as a unit.
struct SwitchState {
    current: Option<Arc<ScriptContext>>,
    pending: Option<InitRequest>,
    worker: Option<WorkerHandle>,
    started_initial: bool,
    lifecycle: LifecycleState,
    /// Generation currently allowed to publish. Bumped by every spawn and by
    /// destroy, so a stale setup phase abandons instead of publishing.
    publish_epoch: u64,
}

struct HostInner {
    ui: TaskExecutor,
    options: HostOptions,
    packages: Vec<ProviderPackage>,
    default_strategy: Arc<dyn EngineStrategy>,
    fault_handler: Arc<dyn FaultHandler>,
    state: Mutex<SwitchState>,
    attachments: AttachmentSet,
    listeners: ListenerSet,
    pressure: MemoryPressureRouter,
    generations: AtomicU64,
}

impl Drop for HostInner {
    fn drop(&mut self) {
        // Embedders are expected to call destroy(); this is the backstop so
        // a dropped host does not leak engine threads.
        let mut state = self.state.lock();
        if let Some(worker) = state.worker.take() {
            worker.interrupt.store(true, Ordering::Release);
        }
        state.publish_epoch = u64::MAX;
        if let Some(context) = state.current.take() {
            context.destroy();
        }
    }
}

/// Builder for [`ScriptHost`], collecting collaborators and options.
pub struct ScriptHostBuilder {
    options: HostOptions,
    packages: Vec<ProviderPackage>,
    strategy: Option<Arc<dyn EngineStrategy>>,
    fault_handler: Arc<dyn FaultHandler>,
}

impl ScriptHostBuilder {
    /// Start a builder with default options and a logging fault handler.
    pub fn new() -> Self {
        Self {
            options: HostOptions::default(),
            packages: Vec::new(),
            strategy: None,
            fault_handler: Arc::new(LoggingFaultHandler),
        }
    }

    /// Replace the host options.
    pub fn options(mut self, options: HostOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a capability-provider package.
    pub fn add_package(mut self, package: ProviderPackage) -> Self {
        self.packages.push(package);
        self
    }

    /// Set the default engine strategy used by `create_initial_context`.
    pub fn engine_strategy(mut self, strategy: Arc<dyn EngineStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the fault handler.
    pub fn fault_handler(mut self, handler: Arc<dyn FaultHandler>) -> Self {
        self.fault_handler = handler;
        self
    }

    /// Build the host. Spawns the UI executor.
    ///
    /// # Panics
    /// If no engine strategy was provided.
    pub fn build(self) -> ScriptHost {
        let strategy = self
            .strategy
            .expect("ScriptHostBuilder: an engine strategy is required");
        let initial_lifecycle = self.options.initial_lifecycle_state;
        ScriptHost {
            inner: Arc::new(HostInner {
                ui: TaskExecutor::new("vela-ui"),
                options: self.options,
                packages: self.packages,
                default_strategy: strategy,
                fault_handler: self.fault_handler,
                state: Mutex::new(SwitchState {
                    current: None,
                    pending: None,
                    worker: None,
                    started_initial: false,
                    lifecycle: initial_lifecycle,
                    publish_epoch: 0,
                }),
                attachments: AttachmentSet::new(),
                listeners: ListenerSet::new(),
                pressure: MemoryPressureRouter::new(),
                generations: AtomicU64::new(1),
            }),
        }
    }
}

impl Default for ScriptHostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Manages the lifecycle of script contexts inside a long-lived host
/// application: asynchronous creation, teardown and replacement, attached
/// surfaces, and foreground/background propagation.
///
/// Cheap to clone; all clones share one coordinator.
#[derive(Clone)]
pub struct ScriptHost {
    inner: Arc<HostInner>,
}

impl ScriptHost {
    /// Start building a host.
    pub fn builder() -> ScriptHostBuilder {
        ScriptHostBuilder::new()
    }

    /// Submit a closure to the host's UI executor. This is how embedders
    /// (and tests) reach the UI-confined entry points.
    pub fn on_ui<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.ui.submit(task);
    }

    fn assert_ui_thread(&self, what: &str) {
        if !self.inner.ui.is_current() {
            panic!(
                "{} must be called on the '{}' executor thread; use ScriptHost::on_ui",
                what,
                self.inner.ui.name()
            );
        }
    }

    /// Kick off construction of the first script context with the default
    /// engine strategy. UI-confined.
    ///
    /// # Panics
    /// If called a second time without an intervening `destroy()`.
    pub fn create_initial_context(&self, bundle: BundleSource) {
        self.assert_ui_thread("create_initial_context");
        log::debug!("ScriptHost.create_initial_context()");
        let mut state = self.inner.state.lock();
        assert!(
            !state.started_initial,
            "create_initial_context may only be called when starting the script application \
             for the first time; use recreate_context to reload, or destroy() for a full teardown"
        );
        state.started_initial = true;
        let request = InitRequest {
            strategy: self.inner.default_strategy.clone(),
            bundle,
        };
        self.recreate_locked(&mut state, request);
    }

    /// Tear down the current context (if any) and build a replacement from
    /// the given strategy and bundle. If a build is already in flight the
    /// request lands in the pending slot, overwriting any previous pending
    /// request; the in-flight worker services it on completion. UI-confined.
    pub fn recreate_context(&self, strategy: Arc<dyn EngineStrategy>, bundle: BundleSource) {
        self.assert_ui_thread("recreate_context");
        log::debug!("ScriptHost.recreate_context('{}')", bundle.display_name());
        let mut state = self.inner.state.lock();
        assert!(
            state.started_initial,
            "recreate_context may only be called after create_initial_context"
        );
        self.recreate_locked(&mut state, InitRequest { strategy, bundle });
    }

    fn recreate_locked(&self, state: &mut SwitchState, request: InitRequest) {
        if state.worker.is_some() {
            log::debug!(
                "build in flight; coalescing recreate of '{}'",
                request.bundle.display_name()
            );
            state.pending = Some(request);
        } else {
            self.spawn_worker(state, request);
        }
    }

    /// Destroy the host's script state: interrupt any in-flight build, tear
    /// down the current context, clear published state, and allow
    /// `create_initial_context` again. UI-confined.
    pub fn destroy(&self) {
        self.assert_ui_thread("destroy");
        log::debug!("ScriptHost.destroy()");
        let mut state = self.inner.state.lock();
        let st = &mut *state;

        lifecycle::move_to_before_create(&mut st.lifecycle, st.current.as_deref());

        if let Some(worker) = st.worker.take() {
            log::debug!(
                "interrupting build worker '{}'",
                worker.thread.thread().name().unwrap_or("?")
            );
            worker.interrupt.store(true, Ordering::Release);
        }
        // Nothing already in flight may publish after this point.
        st.publish_epoch = self.next_generation();
        st.pending = None;

        if let Some(context) = st.current.take() {
            self.tear_down_context(&context, st.lifecycle);
        }
        st.started_initial = false;
    }

    /// Attach a presentation surface. Idempotent. Binds immediately when a
    /// context is current and no build is in flight; otherwise binding is
    /// deferred to the next successful publish. UI-confined.
    pub fn attach_surface(&self, surface: Arc<dyn Surface>) {
        self.assert_ui_thread("attach_surface");
        log::debug!("ScriptHost.attach_surface()");
        if !self.inner.attachments.add(surface.clone()) {
            return;
        }
        let bind_now = {
            let state = self.inner.state.lock();
            if state.worker.is_none() {
                state.current.clone()
            } else {
                None
            }
        };
        if let Some(context) = bind_now {
            self.inner
                .attachments
                .bind_one(&surface, &context.handle(), &self.inner.fault_handler);
        }
    }

    /// Detach a surface. Idempotent. If it holds a live binding, the binding
    /// is unmounted synchronously before the surface leaves the set.
    /// UI-confined.
    pub fn detach_surface(&self, surface: &Arc<dyn Surface>) {
        self.assert_ui_thread("detach_surface");
        log::debug!("ScriptHost.detach_surface()");
        self.inner.attachments.remove(surface);
    }

    /// Host moved to the foreground. UI-confined.
    pub fn on_host_resume(&self) {
        self.assert_ui_thread("on_host_resume");
        let mut state = self.inner.state.lock();
        let st = &mut *state;
        lifecycle::move_to_resumed(&mut st.lifecycle, st.current.as_deref(), false);
    }

    /// Host moved to the background. UI-confined.
    pub fn on_host_pause(&self) {
        self.assert_ui_thread("on_host_pause");
        let mut state = self.inner.state.lock();
        let st = &mut *state;
        lifecycle::move_to_before_resume(&mut st.lifecycle, st.current.as_deref());
    }

    /// The host's owner is going away. Steps the current context down to
    /// `BeforeCreate` without destroying it. UI-confined.
    pub fn on_host_destroy(&self) {
        self.assert_ui_thread("on_host_destroy");
        let mut state = self.inner.state.lock();
        let st = &mut *state;
        lifecycle::move_to_before_create(&mut st.lifecycle, st.current.as_deref());
    }

    /// Register a context-ready listener. Any thread.
    pub fn add_ready_listener(&self, listener: Arc<dyn ContextReadyListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    /// Remove a context-ready listener. Any thread.
    pub fn remove_ready_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// The host's memory-pressure router. Any thread.
    pub fn memory_pressure_router(&self) -> &MemoryPressureRouter {
        &self.inner.pressure
    }

    /// Handle to the current context, if one is published. Any thread.
    pub fn current_context(&self) -> Option<ContextHandle> {
        self.inner.state.lock().current.as_ref().map(|c| c.handle())
    }

    /// The host's lifecycle phase. Any thread.
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.inner.state.lock().lifecycle
    }

    /// Whether `create_initial_context` has been called (and not undone by
    /// `destroy`). Any thread.
    pub fn has_started_creating_initial_context(&self) -> bool {
        self.inner.state.lock().started_initial
    }

    // ------------------------------------------------------------------
    // Worker machinery
    // ------------------------------------------------------------------

    fn next_generation(&self) -> u64 {
        self.inner.generations.fetch_add(1, Ordering::Relaxed)
    }

    /// Tear down the previous context before the next build starts. This
    /// bounds peak usage to one live context plus one build in progress.
    fn spawn_worker(&self, state: &mut SwitchState, request: InitRequest) {
        if let Some(context) = state.current.take() {
            self.tear_down_context(&context, state.lifecycle);
        }

        let generation = self.next_generation();
        state.publish_epoch = generation;
        let interrupt = Arc::new(AtomicBool::new(false));

        log::debug!(
            "spawning build worker gen {} for '{}'",
            generation,
            request.bundle.display_name()
        );

        let host = self.clone();
        let worker_interrupt = interrupt.clone();
        let thread = thread::Builder::new()
            .name(format!("vela-builder-{}", generation))
            .spawn(move || host.run_build(generation, request, worker_interrupt))
            .expect("Failed to spawn build worker thread");

        state.worker = Some(WorkerHandle {
            generation,
            interrupt,
            thread,
        });
    }

    /// Body of the per-build worker thread.
    fn run_build(self, generation: u64, request: InitRequest, interrupt: Arc<AtomicBool>) {
        if self.inner.options.elevate_build_priority {
            executor::set_current_thread_priority(ThreadPriority::Display);
        }

        let built = factory::build_context(&request.strategy, &request.bundle, &self.inner.packages);

        match built {
            Err(fault) => {
                self.clear_worker_handle(generation);
                if interrupt.load(Ordering::Acquire) {
                    log::debug!("gen {}: build failed after interrupt; swallowing", generation);
                } else {
                    error::report(&self.inner.fault_handler, fault);
                }
                let host = self.clone();
                self.inner.ui.submit(move || host.drain_pending());
            }
            Ok(context) => {
                let context = Arc::new(context);
                // Observe cancellation before the publish step; an
                // interrupted build must have no published side effects.
                if interrupt.load(Ordering::Acquire) {
                    log::debug!("gen {}: interrupted; abandoning {}", generation, context.id());
                    self.clear_worker_handle(generation);
                    context.destroy();
                    return;
                }

                if self.inner.options.setup_on_worker_thread {
                    // Publish on the context's own thread; the pending slot
                    // is drained only after the publish step finishes, so an
                    // in-flight request cannot supersede a completed build.
                    self.clear_worker_handle(generation);
                    let host = self.clone();
                    let ctx = context.clone();
                    context.run_on_capability_thread(move || {
                        host.setup_context(ctx, generation);
                        let driver = host.clone();
                        host.inner.ui.submit(move || driver.drain_pending());
                    });
                } else {
                    let host = self.clone();
                    self.inner.ui.submit(move || {
                        host.clear_worker_handle(generation);
                        host.setup_context(context, generation);
                        host.drain_pending();
                    });
                }
            }
        }
    }

    fn clear_worker_handle(&self, generation: u64) {
        let mut state = self.inner.state.lock();
        if state
            .worker
            .as_ref()
            .is_some_and(|worker| worker.generation == generation)
        {
            state.worker = None;
        }
    }

    /// Publish a built context: mark it current, initialize its bridge,
    /// register it for memory pressure, replay the host lifecycle phase,
    /// re-bind every attached surface, and fire ready listeners. Exactly one
    /// publish per worker; a stale epoch means destroy or a newer spawn won
    /// the race, and the context is quietly discarded.
    fn setup_context(&self, context: Arc<ScriptContext>, generation: u64) {
        let handle = context.handle();
        {
            let mut state = self.inner.state.lock();
            if state.publish_epoch != generation {
                drop(state);
                log::debug!("gen {}: superseded before publish; discarding {}", generation, context.id());
                context.destroy();
                return;
            }
            debug_assert!(state.current.is_none(), "publishing over a live context");
            state.current = Some(context.clone());

            if let Err(fault) = context.initialize() {
                state.current = None;
                drop(state);
                context.destroy();
                error::report(&self.inner.fault_handler, fault.into());
                return;
            }

            self.inner.pressure.add_listener(context.clone());
            let st = &mut *state;
            lifecycle::replay_to_current(&mut st.lifecycle, st.current.as_deref());
        }

        // Surface binding and listener callbacks run outside the coordinator
        // lock; callbacks may call back into observers and the listener set.
        self.inner
            .attachments
            .bind_all(&handle, &self.inner.fault_handler);
        self.inner.listeners.notify_ready(&handle);

        if self.inner.options.elevate_build_priority {
            // The context's threads inherited the worker's elevated priority.
            context.run_on_script_thread(|| {
                executor::set_current_thread_priority(ThreadPriority::Normal)
            });
            context.run_on_capability_thread(|| {
                executor::set_current_thread_priority(ThreadPriority::Normal)
            });
        }

        log::debug!("{} published", handle.id());
    }

    /// Service the pending-request slot. Runs on the UI executor after each
    /// build completes, so the most recent recreate request issued during a
    /// build always wins, and at most one worker is ever in flight.
    fn drain_pending(&self) {
        let mut state = self.inner.state.lock();
        if state.worker.is_some() {
            return;
        }
        if let Some(request) = state.pending.take() {
            log::debug!("draining pending recreate of '{}'", request.bundle.display_name());
            self.spawn_worker(&mut state, request);
        }
    }

    fn tear_down_context(&self, context: &Arc<ScriptContext>, lifecycle: LifecycleState) {
        log::debug!("tearing down {}", context.id());
        if lifecycle == LifecycleState::Resumed {
            context.on_host_pause();
        }
        self.inner.attachments.unbind_all();
        let listener: Arc<dyn MemoryPressureListener> = context.clone();
        self.inner.pressure.remove_listener(&listener);
        context.destroy();
    }
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ScriptHost")
            .field("current", &state.current.as_ref().map(|c| c.id()))
            .field("worker_in_flight", &state.worker.is_some())
            .field("pending", &state.pending.is_some())
            .field("lifecycle", &state.lifecycle)
            .field("attached_surfaces", &self.inner.attachments.len())
            .finish()
    }
}
