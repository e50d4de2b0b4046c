//! Host configuration.

use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleState;

/// Plain tunables for a [`crate::ScriptHost`].
///
/// Collaborators (engine strategy, provider packages, fault handler) are
/// collected separately by the builder; this struct holds only data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOptions {
    /// Run the publish-and-attach setup phase on the new context's
    /// capability thread instead of the UI executor, keeping heavy
    /// publication work off the UI thread.
    pub setup_on_worker_thread: bool,

    /// Raise the build worker's scheduling priority while the bundle is
    /// parsed and executed (Linux only; best effort).
    pub elevate_build_priority: bool,

    /// Lifecycle phase the host starts in. Embedders that construct the
    /// host from an already-foregrounded activity pass `Resumed`.
    pub initial_lifecycle_state: LifecycleState,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            setup_on_worker_thread: false,
            elevate_build_priority: true,
            initial_lifecycle_state: LifecycleState::BeforeCreate,
        }
    }
}
