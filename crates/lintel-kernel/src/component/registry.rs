//! Lazy, load-once component resolution.
//!
//! The registry owns the catalog and a single mutable load state behind one
//! async mutex, so an entire resolution pass (the requested component plus
//! its transitive dependencies) runs as one atomic unit. Within a pass,
//! resolution is depth-first: every declared dependency is fully initialized
//! before its dependent's `init` runs.
//!
//! Cycles are detected eagerly via the in-flight stack and fail the load
//! with the full cycle path. An `init` failure is fatal: components loaded
//! so far are torn down in load order and the failure is propagated.

use error_stack::Report;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};

use super::{
    ComponentCatalog, ComponentContext, ComponentError, ComponentHandle, LoadTrace, Origin,
};

type LoadKey = (String, Origin);

#[derive(Default)]
struct RegistryState {
    loaded: HashMap<LoadKey, ComponentHandle>,
    /// Keys in the order their `init` completed; teardown walks this.
    load_order: Vec<LoadKey>,
    /// Resolution stack of the current pass, for cycle detection.
    in_flight: Vec<LoadKey>,
    history: Vec<LoadTrace>,
}

/// Resolves component names to initialized handles, loading each component
/// at most once for the registry's lifetime.
pub struct ComponentRegistry {
    catalog: ComponentCatalog,
    config: Arc<KernelConfig>,
    state: Mutex<RegistryState>,
}

impl ComponentRegistry {
    pub fn new(catalog: ComponentCatalog, config: Arc<KernelConfig>) -> Self {
        Self {
            catalog,
            config,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    /// Resolve `name` under an explicit origin, loading it (and its
    /// transitive dependencies) if this is the first request.
    pub async fn load(&self, name: &str, origin: Origin) -> KernelResult<ComponentHandle> {
        let mut state = self.state.lock().await;
        self.load_inner(&mut state, name.to_string(), Some(origin), None)
            .await
    }

    /// Resolve `name` without an origin: core is probed first, then app.
    pub async fn load_unknown(&self, name: &str) -> KernelResult<ComponentHandle> {
        let mut state = self.state.lock().await;
        self.load_inner(&mut state, name.to_string(), None, None)
            .await
    }

    pub async fn is_loaded(&self, name: &str, origin: Origin) -> bool {
        let state = self.state.lock().await;
        state.loaded.contains_key(&(name.to_string(), origin))
    }

    /// Names of loaded components, in the order their `init` completed.
    pub async fn loaded_components(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.load_order.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Load traces recorded so far (empty unless `trace_loads` is set).
    pub async fn load_history(&self) -> Vec<LoadTrace> {
        let state = self.state.lock().await;
        state.history.clone()
    }

    /// Tear everything down, in load order. Individual teardown failures
    /// are logged and skipped so the rest of the chain still runs.
    pub async fn shutdown(&self) -> KernelResult<()> {
        let mut state = self.state.lock().await;
        self.teardown_locked(&mut state).await;
        Ok(())
    }

    fn load_inner<'a>(
        &'a self,
        state: &'a mut RegistryState,
        name: String,
        origin: Option<Origin>,
        required_by: Option<String>,
    ) -> BoxFuture<'a, KernelResult<ComponentHandle>> {
        Box::pin(async move {
            let spec = match origin {
                Some(origin) => self.catalog.get(&name, origin).ok_or_else(|| {
                    Report::new(KernelError::from(ComponentError::NotFound {
                        name: name.clone(),
                        origin,
                    }))
                })?,
                None => self.catalog.get_unknown(&name).ok_or_else(|| {
                    Report::new(KernelError::from(ComponentError::Unknown(name.clone())))
                })?,
            };
            let key: LoadKey = (spec.name.clone(), spec.origin);

            if let Some(handle) = state.loaded.get(&key) {
                return Ok(handle.clone());
            }

            if let Some(first) = state.in_flight.iter().position(|k| *k == key) {
                let mut path: Vec<String> = state.in_flight[first..]
                    .iter()
                    .map(|(name, _)| name.clone())
                    .collect();
                path.push(spec.name.clone());
                return Err(Report::new(KernelError::from(
                    ComponentError::DependencyCycle { path },
                )));
            }

            let started = Instant::now();
            state.in_flight.push(key.clone());

            let mut deps = HashMap::new();
            for dep in &spec.dependencies {
                let resolved = self
                    .load_inner(&mut *state, dep.clone(), None, Some(spec.name.clone()))
                    .await;
                match resolved {
                    Ok(handle) => {
                        deps.insert(dep.clone(), handle);
                    }
                    Err(report) => {
                        state.in_flight.pop();
                        return Err(report
                            .attach(format!("while resolving dependencies of {}", spec.name)));
                    }
                }
            }

            let effective = match self.config.component_overlay(&spec.name) {
                Some(overlay) => spec.defaults.overlaid(overlay),
                None => spec.defaults.clone(),
            };

            let mut instance = (spec.build)();
            let ctx = ComponentContext::new(spec.name.clone(), effective, deps);
            if let Err(err) = instance.init(&ctx).await {
                let reason = err.to_string();
                state.in_flight.pop();
                error!(component = %spec.name, %reason, "component init failed, unwinding");
                self.teardown_locked(state).await;
                return Err(Report::new(KernelError::from(ComponentError::InitFailed {
                    name: spec.name.clone(),
                    reason,
                })));
            }

            let handle: ComponentHandle = Arc::new(RwLock::new(instance));
            state.loaded.insert(key.clone(), handle.clone());
            state.load_order.push(key);
            state.in_flight.pop();

            let elapsed_ms = started.elapsed().as_millis() as u64;
            if self.config.trace_loads {
                state.history.push(LoadTrace::new(
                    spec.name.clone(),
                    spec.origin,
                    required_by,
                    elapsed_ms,
                ));
            }
            debug!(component = %spec.name, origin = %spec.origin, elapsed_ms, "component loaded");

            Ok(handle)
        })
    }

    async fn teardown_locked(&self, state: &mut RegistryState) {
        let order = std::mem::take(&mut state.load_order);
        for key in &order {
            if let Some(handle) = state.loaded.remove(key) {
                let mut component = handle.write().await;
                match component.teardown().await {
                    Ok(()) => debug!(component = %key.0, "component torn down"),
                    Err(err) => {
                        warn!(component = %key.0, error = %err, "component teardown failed, continuing")
                    }
                }
            }
        }
        state.loaded.clear();
        state.in_flight.clear();
    }
}
