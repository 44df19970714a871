//! Components: named units of capability with explicit dependencies.
//!
//! A component is anything that can be initialized once, invoked by method
//! name during dispatch, and torn down at shutdown. Components never reach
//! for each other directly; they declare dependencies by name in their
//! [`ComponentSpec`] and receive ready handles through the
//! [`ComponentContext`] passed to [`Component::init`].
//!
//! The [`ComponentRegistry`] resolves those declarations lazily: nothing is
//! built until first requested, and a component loaded once is reused by
//! every later requester.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::action::HandlerOutcome;
use crate::config::deep_merge;
use crate::context::KernelContext;
use crate::request::{BoundRequest, RawRequest};

pub mod catalog;
pub mod error;
pub mod history;
pub mod registry;

pub use catalog::{BuildFn, ComponentCatalog, ComponentSpec, RegisterFn};
pub use error::{ComponentError, ComponentResult};
pub use history::LoadTrace;
pub use registry::ComponentRegistry;

/// Which namespace a component was registered under.
///
/// The two namespaces are disjoint: the same name may exist in both, and a
/// lookup names one explicitly or probes core first, then app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Shipped with the kernel.
    Core,
    /// Supplied by the embedding application.
    App,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Core => write!(f, "core"),
            Origin::App => write!(f, "app"),
        }
    }
}

/// Effective configuration for one component: registration-time defaults
/// overlaid with the deployment's `[components.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    #[serde(flatten)]
    values: serde_json::Map<String, Value>,
}

impl ComponentConfig {
    pub fn new(values: serde_json::Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// These defaults with `overlay` merged on top, deployment keys winning.
    pub fn overlaid(&self, overlay: &Value) -> Self {
        let mut merged = Value::Object(self.values.clone());
        deep_merge(&mut merged, overlay);
        match merged {
            Value::Object(values) => Self { values },
            _ => self.clone(),
        }
    }
}

/// Shared handle to a loaded component.
///
/// Invocations take the write half since handlers may mutate their state.
pub type ComponentHandle = Arc<RwLock<Box<dyn Component>>>;

/// What a component sees while initializing: its own effective config and
/// ready handles for exactly the dependencies it declared.
pub struct ComponentContext {
    component: String,
    config: ComponentConfig,
    deps: HashMap<String, ComponentHandle>,
}

impl ComponentContext {
    pub(crate) fn new(
        component: impl Into<String>,
        config: ComponentConfig,
        deps: HashMap<String, ComponentHandle>,
    ) -> Self {
        Self {
            component: component.into(),
            config,
            deps,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Handle to a declared dependency, already initialized.
    ///
    /// Asking for a name outside the declared list is a programming error
    /// and is reported rather than silently loaded.
    pub fn dependency(&self, name: &str) -> ComponentResult<ComponentHandle> {
        self.deps
            .get(name)
            .cloned()
            .ok_or_else(|| ComponentError::UndeclaredDependency {
                component: self.component.clone(),
                dependency: name.to_string(),
            })
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.deps.keys().map(String::as_str).collect()
    }
}

/// A unit of capability managed by the registry.
///
/// `init` runs exactly once, after every declared dependency has finished
/// its own `init`. `invoke` is called per dispatched action with the method
/// name the action registered. `teardown` runs once at shutdown, in load
/// order.
#[async_trait]
pub trait Component: Send + Sync {
    async fn init(&mut self, _ctx: &ComponentContext) -> ComponentResult<()> {
        Ok(())
    }

    async fn invoke(
        &mut self,
        method: &str,
        request: &RawRequest,
        binding: &BoundRequest,
        ctx: &KernelContext,
    ) -> ComponentResult<HandlerOutcome>;

    async fn teardown(&mut self) -> ComponentResult<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Component")
    }
}
