//! Strategy lookup by protocol name.
//!
//! The host builds a registry at startup and passes it wherever strategies
//! are instantiated. Nothing registers itself implicitly.

use hashbrown::HashMap;
use tracing::debug;

use crate::config::StrategyConfig;
use crate::error::RegistryError;
use crate::multicast::MulticastStrategy;
use crate::name::Name;
use crate::strategy::TraceForwardingStrategy;
use crate::traits::Strategy;
use crate::types::{MULTICAST_STRATEGY, TRACE_FORWARDING_STRATEGY};

/// Builds a strategy instance from its configuration.
pub type StrategyFactory = fn(&StrategyConfig) -> Box<dyn Strategy>;

#[derive(Default)]
pub struct StrategyRegistry {
    factories: HashMap<Name, StrategyFactory>,
}

impl StrategyRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the trace-forwarding and multicast strategies.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            Name::from_components(TRACE_FORWARDING_STRATEGY.split('/')),
            |config| Box::new(TraceForwardingStrategy::new(config.clone())),
        );
        registry.factories.insert(
            Name::from_components(MULTICAST_STRATEGY.split('/')),
            |config| Box::new(MulticastStrategy::new(config)),
        );
        registry
    }

    pub fn register(&mut self, name: Name, factory: StrategyFactory) -> Result<(), RegistryError> {
        if self.factories.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        debug!(strategy = %name, "strategy registered");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn create(&self, name: &Name, config: &StrategyConfig) -> Result<Box<dyn Strategy>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::Unknown(name.clone()))?;
        Ok(factory(config))
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}
