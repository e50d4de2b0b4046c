//! Vela Host
//!
//! Orchestrates the lifecycle of an embedded Vela script context inside a
//! long-lived host application: asynchronous creation on a dedicated worker,
//! coalesced recreate requests, ordered teardown before replacement,
//! attached presentation surfaces, host foreground/background propagation,
//! and context-ready notification fan-out.
//!
//! The scripting engine itself, bundle transport, and rendering are external
//! collaborators consumed through the traits in [`vela_sdk`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vela_host::ScriptHost;
//! use vela_sdk::BundleSource;
//!
//! let host = ScriptHost::builder()
//!     .engine_strategy(Arc::new(MyEngineStrategy))
//!     .build();
//! let h = host.clone();
//! host.on_ui(move || {
//!     h.create_initial_context(BundleSource::File("main.vbundle".into()));
//! });
//! ```

mod attachments;
mod context;
mod error;
mod executor;
mod factory;
mod host;
mod lifecycle;
mod listeners;
mod options;
mod pressure;
mod registry;

pub use context::ScriptContext;
pub use error::LoggingFaultHandler;
pub use executor::{set_current_thread_priority, TaskExecutor, ThreadPriority};
pub use host::{ScriptHost, ScriptHostBuilder};
pub use lifecycle::LifecycleState;
pub use listeners::ListenerId;
pub use options::HostOptions;
pub use pressure::MemoryPressureRouter;
pub use registry::{build_registry, RegistryBuilder};
