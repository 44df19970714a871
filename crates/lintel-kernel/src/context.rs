//! The shared kernel context: everything dispatch needs, behind `Arc`s.

use std::fmt;
use std::sync::Arc;

use error_stack::Report;

use crate::action::ActionRegistry;
use crate::cache::{MemoryCache, ResponseCache};
use crate::component::{ComponentCatalog, ComponentRegistry};
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::security::{SecurityGuard, StandardGuard};

/// Immutable bundle of kernel services, cheap to clone into handlers.
///
/// Built once at bootstrap: the catalog's action hooks are run first (so a
/// bad action table fails before anything loads), then the component
/// registry takes ownership of the catalog. The default wiring uses the
/// in-process [`MemoryCache`] and the [`StandardGuard`]; both can be
/// swapped before the context is shared.
#[derive(Clone)]
pub struct KernelContext {
    registry: Arc<ComponentRegistry>,
    actions: Arc<ActionRegistry>,
    cache: Arc<dyn ResponseCache>,
    guard: Arc<dyn SecurityGuard>,
    config: Arc<KernelConfig>,
}

impl KernelContext {
    pub fn new(catalog: ComponentCatalog, config: KernelConfig) -> KernelResult<Self> {
        let config = Arc::new(config);
        let actions = ActionRegistry::from_catalog(&catalog, &config)
            .map_err(|err| Report::new(KernelError::from(err)))?;
        Ok(Self {
            registry: Arc::new(ComponentRegistry::new(catalog, config.clone())),
            actions: Arc::new(actions),
            cache: Arc::new(MemoryCache::new()),
            guard: Arc::new(StandardGuard::new()),
            config,
        })
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_guard(mut self, guard: Arc<dyn SecurityGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn cache(&self) -> &dyn ResponseCache {
        self.cache.as_ref()
    }

    pub fn guard(&self) -> &dyn SecurityGuard {
        self.guard.as_ref()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Tear down every loaded component, in load order.
    pub async fn shutdown(&self) -> KernelResult<()> {
        self.registry.shutdown().await
    }
}

impl fmt::Debug for KernelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
