//! Capability registry construction.
//!
//! Folds a sequence of provider packages into the name-keyed
//! [`CapabilityRegistry`] a script context dispatches against. Duplicate
//! capability names are a build fault, not a silent override.

use vela_sdk::{CapabilityRegistry, ProviderPackage, RegistryFault};

/// Builder that folds provider packages into a [`CapabilityRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    registry: CapabilityRegistry,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single package: run its instrumentation brackets and fold
    /// its capabilities into the table.
    pub fn process_package(&mut self, package: &ProviderPackage) -> Result<(), RegistryFault> {
        log::debug!(
            "processing provider package '{}' ({} capabilities)",
            package.name(),
            package.capabilities().len()
        );
        if let Some(hooks) = package.hooks() {
            hooks.begin_processing();
        }

        let result = self.fold_capabilities(package);

        if let Some(hooks) = package.hooks() {
            hooks.end_processing();
        }
        result
    }

    fn fold_capabilities(&mut self, package: &ProviderPackage) -> Result<(), RegistryFault> {
        for descriptor in package.capabilities() {
            if self
                .registry
                .insert(descriptor.name(), descriptor.handler())
                .is_some()
            {
                return Err(RegistryFault::DuplicateCapability {
                    name: descriptor.name().to_string(),
                    package: package.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Finish building and return the registry.
    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}

/// Fold all packages into a finished registry.
pub fn build_registry(packages: &[ProviderPackage]) -> Result<CapabilityRegistry, RegistryFault> {
    let mut builder = RegistryBuilder::new();
    for package in packages {
        builder.process_package(package)?;
    }
    let registry = builder.build();
    log::debug!("capability registry built: {} capabilities", registry.len());
    Ok(registry)
}
