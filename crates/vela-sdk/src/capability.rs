//! Capability providers and the name-keyed capability registry.
//!
//! Providers are described as tagged data (a package name plus a list of
//! named handler descriptors), not polymorphic objects. The host folds a
//! sequence of packages into a [`CapabilityRegistry`], erroring on duplicate
//! names; after that, dispatch is a plain map lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::fault::CapabilityError;

/// A value passed across the capability call bridge.
///
/// The wire format of bridge calls is out of scope for the host; this is the
/// minimal tagged representation handlers and surfaces exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityValue {
    /// Absent / null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer value.
    I64(i64),
    /// 64-bit float value.
    F64(f64),
    /// String value.
    Str(String),
}

/// Handler function for a single named capability.
pub type CapabilityFn = fn(&[CapabilityValue]) -> Result<CapabilityValue, CapabilityError>;

/// A single named capability contributed by a provider package.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    name: String,
    handler: CapabilityFn,
}

impl CapabilityDescriptor {
    /// Create a descriptor binding `name` to `handler`.
    pub fn new(name: impl Into<String>, handler: CapabilityFn) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// The capability's registry name (e.g. `"clock.now"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler function.
    pub fn handler(&self) -> CapabilityFn {
        self.handler
    }
}

impl std::fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// Instrumentation brackets invoked around processing of a single package.
///
/// Purely observational: the host calls `begin_processing` before folding a
/// package's capabilities into the registry and `end_processing` after,
/// regardless of outcome.
pub trait PackageHooks: Send + Sync {
    /// Called before the package's capabilities are processed.
    fn begin_processing(&self) {}
    /// Called after the package's capabilities have been processed.
    fn end_processing(&self) {}
}

/// A provider package: a named group of capability descriptors.
#[derive(Clone)]
pub struct ProviderPackage {
    name: String,
    capabilities: Vec<CapabilityDescriptor>,
    hooks: Option<Arc<dyn PackageHooks>>,
}

impl ProviderPackage {
    /// Create an empty package with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            hooks: None,
        }
    }

    /// Add a capability descriptor to the package.
    pub fn with_capability(mut self, descriptor: CapabilityDescriptor) -> Self {
        self.capabilities.push(descriptor);
        self
    }

    /// Attach instrumentation hooks to the package.
    pub fn with_hooks(mut self, hooks: Arc<dyn PackageHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// The package name, used in logs and duplicate-capability faults.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capabilities this package contributes.
    pub fn capabilities(&self) -> &[CapabilityDescriptor] {
        &self.capabilities
    }

    /// Instrumentation hooks, if the package exposes them.
    pub fn hooks(&self) -> Option<&Arc<dyn PackageHooks>> {
        self.hooks.as_ref()
    }
}

impl std::fmt::Debug for ProviderPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderPackage")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}

/// Name-keyed table of capability handlers consumed by a script context.
///
/// Built once per context by the host's registry builder; immutable and
/// shared afterwards. Dispatch is a direct map lookup.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: HashMap<String, CapabilityFn>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handler under `name`. Returns the previous handler if the
    /// name was already taken (builders treat that as a duplicate fault).
    pub fn insert(&mut self, name: impl Into<String>, handler: CapabilityFn) -> Option<CapabilityFn> {
        self.entries.insert(name.into(), handler)
    }

    /// Look up a handler by name.
    pub fn get(&self, name: &str) -> Option<CapabilityFn> {
        self.entries.get(name).copied()
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Invoke the named capability.
    pub fn invoke(
        &self,
        name: &str,
        args: &[CapabilityValue],
    ) -> Result<CapabilityValue, CapabilityError> {
        match self.get(name) {
            Some(handler) => handler(args),
            None => Err(CapabilityError::Unknown(name.to_string())),
        }
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over registered capability names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("count", &self.entries.len())
            .finish()
    }
}
