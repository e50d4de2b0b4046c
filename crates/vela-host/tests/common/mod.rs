//! Shared test doubles: recording engines and surfaces, a gate for holding
//! builds in flight, and helpers for driving the UI-confined API.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use vela_host::{HostOptions, ScriptHost};
use vela_sdk::{
    BundleSource, CapabilityRegistry, ContextHandle, ContextReadyListener, EngineFault,
    EngineStrategy, FaultHandler, HostFault, MemoryPressureLevel, ScriptEngine, Surface,
    SurfaceFault, SurfaceId,
};

/// Append-only, thread-safe event journal. The append order is the real
/// interleaving across all threads.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.events.lock().iter().any(|e| e == event)
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn index_of(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    /// Poll until the event appears or the timeout elapses.
    pub fn wait_for(&self, event: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.contains(event) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.contains(event)
    }

    /// Poll until `predicate` holds over a snapshot, or the timeout elapses.
    pub fn wait_until(&self, timeout: Duration, predicate: impl Fn(&[String]) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if predicate(&self.snapshot()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

/// Counting gate used to hold a build in flight at a known point.
#[derive(Default)]
pub struct Gate {
    permits: Mutex<usize>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `n` passes available.
    pub fn open(&self, n: usize) {
        *self.permits.lock() += n;
        self.cv.notify_all();
    }

    /// Block until a pass is available, then consume it.
    pub fn pass(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self
                .cv
                .wait_for(&mut permits, Duration::from_secs(10))
                .timed_out()
            {
                panic!("gate never opened");
            }
        }
        *permits -= 1;
    }
}

/// Engine double: journals every hook; optionally blocks in `run_bundle`
/// until the gate opens; fails bundles whose name starts with "bad".
pub struct TestEngine {
    label: String,
    events: Arc<EventLog>,
    gate: Option<Arc<Gate>>,
}

impl ScriptEngine for TestEngine {
    fn initialize_bridge(&self) -> Result<(), EngineFault> {
        self.events.record(format!("bridge:{}", self.label));
        Ok(())
    }

    fn run_bundle(&self, bundle: &BundleSource) -> Result<(), EngineFault> {
        if let Some(gate) = &self.gate {
            gate.pass();
        }
        let name = bundle.display_name();
        if name.starts_with("bad") {
            self.events.record(format!("build_failed:{}", name));
            return Err(EngineFault::Bundle(format!("cannot execute '{}'", name)));
        }
        self.events.record(format!("build:{}", name));
        Ok(())
    }

    fn on_resume(&self) {
        self.events.record(format!("resume:{}", self.label));
    }

    fn on_pause(&self) {
        self.events.record(format!("pause:{}", self.label));
    }

    fn on_host_destroy(&self) {
        self.events.record(format!("host_destroy:{}", self.label));
    }

    fn on_memory_pressure(&self, level: MemoryPressureLevel) {
        self.events
            .record(format!("pressure:{}:{:?}", self.label, level));
    }

    fn destroy(&self) {
        self.events.record(format!("destroy:{}", self.label));
    }
}

/// Strategy double: serial-numbers its engines (`engine1`, `engine2`, ...).
pub struct TestStrategy {
    events: Arc<EventLog>,
    gate: Option<Arc<Gate>>,
    serial: AtomicUsize,
}

impl TestStrategy {
    pub fn new(events: Arc<EventLog>, gate: Option<Arc<Gate>>) -> Arc<Self> {
        Arc::new(Self {
            events,
            gate,
            serial: AtomicUsize::new(0),
        })
    }
}

impl EngineStrategy for TestStrategy {
    fn create(
        &self,
        _registry: Arc<CapabilityRegistry>,
    ) -> Result<Box<dyn ScriptEngine>, EngineFault> {
        let label = format!("engine{}", self.serial.fetch_add(1, Ordering::SeqCst) + 1);
        self.events.record(format!("create:{}", label));
        Ok(Box::new(TestEngine {
            label,
            events: self.events.clone(),
            gate: self.gate.clone(),
        }))
    }
}

/// Surface double journaling the bind protocol.
pub struct RecordingSurface {
    label: String,
    events: Arc<EventLog>,
    fail_bind: bool,
    next_id: AtomicU64,
}

impl RecordingSurface {
    pub fn new(label: &str, events: Arc<EventLog>) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            events,
            fail_bind: false,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn failing(label: &str, events: Arc<EventLog>) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            events,
            fail_bind: true,
            next_id: AtomicU64::new(1),
        })
    }
}

impl Surface for RecordingSurface {
    fn bind(&self, _context: &ContextHandle) -> Result<SurfaceId, SurfaceFault> {
        if self.fail_bind {
            return Err(SurfaceFault::Bind(format!("{}: widget gone", self.label)));
        }
        self.events.record(format!("bind:{}", self.label));
        Ok(SurfaceId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn run_entry_point(&self) -> Result<(), SurfaceFault> {
        self.events.record(format!("run:{}", self.label));
        Ok(())
    }

    fn unbind(&self, _id: SurfaceId) {
        self.events.record(format!("unbind:{}", self.label));
    }

    fn notify_bound(&self) {
        self.events.record(format!("notify_bound:{}", self.label));
    }
}

/// Ready listener forwarding publishes to a channel.
pub struct ChannelReadyListener {
    events: Arc<EventLog>,
    tx: Sender<u64>,
}

impl ChannelReadyListener {
    pub fn new(events: Arc<EventLog>, tx: Sender<u64>) -> Self {
        Self { events, tx }
    }
}

impl ContextReadyListener for ChannelReadyListener {
    fn on_context_ready(&self, context: &ContextHandle) {
        self.events.record(format!("ready:{}", context.id()));
        let _ = self.tx.send(context.id().as_u64());
    }
}

/// Fault handler collecting everything it receives.
#[derive(Default)]
pub struct CollectingFaults {
    faults: Mutex<Vec<HostFault>>,
}

impl CollectingFaults {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.faults.lock().len()
    }

    pub fn snapshot(&self) -> Vec<HostFault> {
        self.faults.lock().clone()
    }
}

impl FaultHandler for CollectingFaults {
    fn handle(&self, fault: HostFault) {
        self.faults.lock().push(fault);
    }
}

/// A fully wired host with recording collaborators.
pub struct Harness {
    pub host: ScriptHost,
    pub events: Arc<EventLog>,
    pub strategy: Arc<TestStrategy>,
    pub faults: Arc<CollectingFaults>,
    pub ready_rx: Receiver<u64>,
}

pub fn harness(options: HostOptions) -> Harness {
    harness_with_gate(options, None)
}

pub fn gated_harness(options: HostOptions) -> (Harness, Arc<Gate>) {
    let gate = Gate::new();
    (harness_with_gate(options, Some(gate.clone())), gate)
}

fn harness_with_gate(options: HostOptions, gate: Option<Arc<Gate>>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let events = EventLog::new();
    let strategy = TestStrategy::new(events.clone(), gate);
    let faults = CollectingFaults::new();
    let host = ScriptHost::builder()
        .options(options)
        .engine_strategy(strategy.clone())
        .fault_handler(faults.clone())
        .build();

    let (tx, ready_rx) = unbounded();
    host.add_ready_listener(Arc::new(ChannelReadyListener {
        events: events.clone(),
        tx,
    }));

    Harness {
        host,
        events,
        strategy,
        faults,
        ready_rx,
    }
}

/// Run a closure on the UI executor and wait for its result.
pub fn ui_call<T, F>(host: &ScriptHost, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded(1);
    host.on_ui(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("UI call timed out")
}

/// Wait for the next publish notification.
pub fn recv_ready(rx: &Receiver<u64>) -> u64 {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("no context became ready in time")
}

/// Assert that no publish happens within the window.
pub fn expect_no_ready(rx: &Receiver<u64>, window: Duration) {
    if let Ok(id) = rx.recv_timeout(window) {
        panic!("unexpected publish of context {}", id);
    }
}

pub fn bundle(name: &str) -> BundleSource {
    BundleSource::from_bytes(name, name.as_bytes().to_vec())
}
