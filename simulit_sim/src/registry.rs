//! In-process catalog of simulation modules.

use crate::error::HostError;
use crate::modules;
use crate::simulation::SimulationModule;
use std::sync::Arc;
use tracing::debug;

/// Modules available to a host, looked up by display name or slug.
///
/// `"Monte Carlo Pi"`, `"monte carlo pi"` and `"monte-carlo-pi"` all name
/// the same module.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn SimulationModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in module.
    pub fn with_builtin() -> Self {
        Self {
            modules: modules::builtin(),
        }
    }

    /// Adds a module; its slug must not collide with a registered one.
    pub fn register(&mut self, module: Arc<dyn SimulationModule>) -> Result<(), HostError> {
        let key = slug(module.name());
        if self.modules.iter().any(|known| slug(known.name()) == key) {
            return Err(HostError::DuplicateModule(module.name().to_string()));
        }
        debug!("Registry: registered {}", module.name());
        self.modules.push(module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn SimulationModule>, HostError> {
        let key = slug(name);
        self.modules
            .iter()
            .find(|module| slug(module.name()) == key)
            .cloned()
            .ok_or_else(|| HostError::UnknownModule(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SimulationModule>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Lowercase words joined by single dashes.
pub fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
