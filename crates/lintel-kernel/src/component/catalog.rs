//! The catalog of registered component specs.
//!
//! Registration happens at bootstrap and is purely declarative: a spec names
//! the component, its origin, the dependencies it needs by name, default
//! configuration and a factory closure. Nothing is constructed until the
//! registry first resolves the name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::{ActionError, ActionRegistry};

use super::{Component, ComponentConfig, ComponentError, ComponentResult, Origin};

/// Factory producing a fresh, uninitialized component instance.
pub type BuildFn = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Hook contributing this component's actions to the action registry.
pub type RegisterFn = Arc<dyn Fn(&mut ActionRegistry) -> Result<(), ActionError> + Send + Sync>;

/// Everything the kernel knows about a component before it is loaded.
#[derive(Clone)]
pub struct ComponentSpec {
    pub name: String,
    pub origin: Origin,
    /// Names resolved origin-agnostically (core first) before `init` runs.
    pub dependencies: Vec<String>,
    pub defaults: ComponentConfig,
    pub build: BuildFn,
    pub register_actions: Option<RegisterFn>,
}

impl ComponentSpec {
    pub fn new(
        name: impl Into<String>,
        origin: Origin,
        build: impl Fn() -> Box<dyn Component> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            dependencies: Vec::new(),
            defaults: ComponentConfig::default(),
            build: Arc::new(build),
            register_actions: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<impl Into<String>>) -> Self {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_defaults(mut self, defaults: ComponentConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_actions(
        mut self,
        register: impl Fn(&mut ActionRegistry) -> Result<(), ActionError> + Send + Sync + 'static,
    ) -> Self {
        self.register_actions = Some(Arc::new(register));
        self
    }
}

impl fmt::Debug for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSpec")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("dependencies", &self.dependencies)
            .field("defaults", &self.defaults)
            .field("has_actions", &self.register_actions.is_some())
            .finish()
    }
}

/// Insertion-ordered collection of specs, indexed by `(name, origin)`.
#[derive(Default)]
pub struct ComponentCatalog {
    entries: Vec<ComponentSpec>,
    index: HashMap<(String, Origin), usize>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spec. The `(name, origin)` pair must be unused; the same name
    /// under the other origin is a different component.
    pub fn register(&mut self, spec: ComponentSpec) -> ComponentResult<()> {
        let key = (spec.name.clone(), spec.origin);
        if self.index.contains_key(&key) {
            return Err(ComponentError::Duplicate { name: spec.name });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str, origin: Origin) -> Option<&ComponentSpec> {
        self.index
            .get(&(name.to_string(), origin))
            .map(|&i| &self.entries[i])
    }

    /// Origin-agnostic lookup: core first, then app.
    pub fn get_unknown(&self, name: &str) -> Option<&ComponentSpec> {
        self.get(name, Origin::Core).or_else(|| self.get(name, Origin::App))
    }

    pub fn contains(&self, name: &str, origin: Origin) -> bool {
        self.index.contains_key(&(name.to_string(), origin))
    }

    /// Specs in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCatalog")
            .field("entries", &self.entries)
            .finish()
    }
}
