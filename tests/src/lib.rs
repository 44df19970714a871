//! Lintel testing utilities.
//!
//! Mock components and harness helpers for exercising the kernel without a
//! running host: build a catalog from specs, get a context or dispatcher,
//! and drive requests straight at it.


use lintel_kernel::component::{ComponentCatalog, ComponentSpec};
use lintel_kernel::{Dispatcher, KernelConfig, KernelContext};

/// Assemble a kernel context from the given specs.
pub fn kernel_context(specs: Vec<ComponentSpec>, config: KernelConfig) -> KernelContext {
    let mut catalog = ComponentCatalog::new();
    for spec in specs {
        catalog.register(spec).expect("duplicate spec in test catalog");
    }
    KernelContext::new(catalog, config).expect("kernel context bootstrap")
}

/// Assemble a dispatcher over a fresh kernel context.
pub fn dispatcher(specs: Vec<ComponentSpec>, config: KernelConfig) -> Dispatcher {
    Dispatcher::new(kernel_context(specs, config))
}
