//! Named single-thread task executors.
//!
//! Every thread the host touches is a named executor: the UI executor owned
//! by the host, the per-context script and capability executors, and the
//! per-build worker (which is plain enough to stay a raw thread). Submission
//! is a crossbeam channel send; the executor thread drains jobs in order
//! until shut down.

use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A named dispatch thread that runs submitted closures in order.
///
/// `shutdown` is safe from any thread, including the executor's own, and
/// never holds a lock across the join, so jobs may submit to (or shut down)
/// their own executor without deadlocking.
pub struct TaskExecutor {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskExecutor {
    /// Spawn a new executor thread with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (sender, receiver) = unbounded::<Job>();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // Channel closure is the shutdown signal.
                for job in receiver.iter() {
                    job();
                }
            })
            .expect("Failed to spawn executor thread");

        let thread_id = handle.thread().id();

        Self {
            name,
            sender: Mutex::new(Some(sender)),
            thread_id,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// The executor's thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the calling thread is this executor's thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Submit a job. Jobs submitted after shutdown are dropped with a warning.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => {
                if sender.send(Box::new(job)).is_err() {
                    log::warn!("executor '{}' is gone; dropping job", self.name);
                }
            }
            None => log::warn!("executor '{}' is shut down; dropping job", self.name),
        }
    }

    /// Stop accepting jobs, drain the queue, and join the thread (unless
    /// called from the executor's own thread, which would self-join).
    pub fn shutdown(&self) {
        self.sender.lock().take();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("name", &self.name)
            .field("alive", &self.sender.lock().is_some())
            .finish()
    }
}

/// Scheduling priority applied to the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPriority {
    /// Default scheduling priority.
    Normal,
    /// Elevated priority used while a bundle is being parsed and executed,
    /// so a foreground reload is not starved by background work.
    Display,
}

/// Best-effort: adjust the calling thread's scheduling priority.
///
/// Only implemented on Linux (per-thread nice value); a no-op elsewhere.
#[cfg(target_os = "linux")]
pub fn set_current_thread_priority(priority: ThreadPriority) {
    let nice = match priority {
        ThreadPriority::Normal => 0,
        ThreadPriority::Display => -4,
    };
    // SAFETY: gettid/setpriority act on the calling thread only.
    unsafe {
        let tid = libc::gettid();
        if libc::setpriority(libc::PRIO_PROCESS, tid as libc::id_t, nice) != 0 {
            log::debug!(
                "setpriority({}) failed: {}",
                nice,
                std::io::Error::last_os_error()
            );
        }
    }
}

/// Best-effort: adjust the calling thread's scheduling priority.
#[cfg(not(target_os = "linux"))]
pub fn set_current_thread_priority(_priority: ThreadPriority) {}
