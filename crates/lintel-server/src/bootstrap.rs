//! Kernel wiring shared by both entry points.

use anyhow::Context as _;
use std::path::Path;
use tracing::info;

use lintel_kernel::component::ComponentCatalog;
use lintel_kernel::config::{self, KernelConfig};
use lintel_kernel::KernelContext;

use crate::components;

/// Build the kernel context: load the optional config file, register the
/// core components and collect their actions.
pub fn build_context(config_path: Option<&Path>) -> anyhow::Result<KernelContext> {
    let config: KernelConfig = match config_path {
        Some(path) => {
            let path_str = path.to_string_lossy();
            let loaded = config::load_config(&path_str)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            info!(path = %path.display(), "configuration loaded");
            loaded
        }
        None => KernelConfig::default(),
    };

    let mut catalog = ComponentCatalog::new();
    catalog
        .register(components::status_spec())
        .context("registering core components")?;

    KernelContext::new(catalog, config).map_err(|report| anyhow::anyhow!("{report:?}"))
}
