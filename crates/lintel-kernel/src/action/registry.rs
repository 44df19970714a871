//! The immutable table of registered actions.

use std::collections::HashMap;

use crate::component::ComponentCatalog;
use crate::config::KernelConfig;

use super::{ActionDescriptor, ActionError};

/// All actions known to the kernel, in registration order.
///
/// Registration order matters: the dispatcher offers a request to matching
/// actions in exactly this order. The registry is completed at bootstrap
/// and never mutated afterwards.
#[derive(Debug)]
pub struct ActionRegistry {
    actions: Vec<ActionDescriptor>,
    index: HashMap<String, usize>,
    cache_prefix: String,
    cache_ttl_secs: u64,
}

impl ActionRegistry {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            actions: Vec::new(),
            index: HashMap::new(),
            cache_prefix: config.cache_prefix.clone(),
            cache_ttl_secs: config.cache_ttl_secs,
        }
    }

    /// Build a registry by running every component's action hook, in
    /// catalog registration order.
    pub fn from_catalog(
        catalog: &ComponentCatalog,
        config: &KernelConfig,
    ) -> Result<Self, ActionError> {
        let mut registry = Self::new(config);
        for spec in catalog.specs() {
            if let Some(register) = &spec.register_actions {
                register(&mut registry)?;
            }
        }
        Ok(registry)
    }

    /// Add one action. Names are unique across the whole registry; cached
    /// actions without an explicit prefix or TTL inherit the kernel
    /// defaults here, so execution never needs to consult the config again.
    pub fn register(&mut self, mut action: ActionDescriptor) -> Result<(), ActionError> {
        action.validate()?;
        if self.index.contains_key(&action.name) {
            return Err(ActionError::DuplicateAction(action.name));
        }
        if action.policy.cache {
            if action.policy.cache_prefix.is_none() {
                action.policy.cache_prefix =
                    Some(format!("{}:{}", self.cache_prefix, action.name));
            }
            if action.policy.cache_ttl_secs.is_none() {
                action.policy.cache_ttl_secs = Some(self.cache_ttl_secs);
            }
        }
        self.index.insert(action.name.clone(), self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.index.get(name).map(|&i| &self.actions[i])
    }

    /// Descriptors in registration order.
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
