//! Kernel configuration.
//!
//! [`KernelConfig`] carries the process-wide knobs the kernel consults at
//! runtime: development mode, load tracing, cache defaults, the brute-force
//! throttle window, the server host used for URL building and CSRF origin
//! checks, and per-component configuration tables that are deep-merged over
//! each component's hard-coded defaults.
//!
//! File loading (format auto-detection, `${VAR}` / `$VAR` environment
//! substitution) lives in [`loader`] behind the `config` feature so callers
//! that construct a [`KernelConfig`] in code pay no extra compile cost.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "config")]
pub mod loader;
#[cfg(feature = "config")]
pub use loader::{detect_format, from_str, load_config, substitute_env_vars};

/// Configuration error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Process-wide kernel configuration.
///
/// Every field has a serde default so a partial config file (or none at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Development mode: verbose diagnostics in 500-class responses.
    pub development: bool,
    /// Record a timestamped history entry for every component load.
    pub trace_loads: bool,
    /// Host (and optional port) this process serves, e.g. `example.com:8080`.
    /// Used by URL building and the CSRF origin check.
    pub server_host: String,
    /// Default cache key prefix for actions that enable caching without
    /// naming their own prefix.
    pub cache_prefix: String,
    /// Default cache TTL in seconds for actions that enable caching without
    /// naming their own TTL.
    pub cache_ttl_secs: u64,
    /// Lower bound of the randomized sleep applied when a brute-force
    /// sensitive action declines, in milliseconds.
    pub brute_force_min_ms: u64,
    /// Upper bound of that randomized sleep, in milliseconds.
    pub brute_force_max_ms: u64,
    /// Per-component configuration tables, deep-merged over each component's
    /// catalog defaults at load time. Keyed by component name.
    pub components: HashMap<String, serde_json::Value>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            development: false,
            trace_loads: false,
            server_host: "localhost".to_string(),
            cache_prefix: "lintel".to_string(),
            cache_ttl_secs: 300,
            brute_force_min_ms: 250,
            brute_force_max_ms: 1_000,
            components: HashMap::new(),
        }
    }
}

impl KernelConfig {
    /// The configuration table for one component, if the file declared one.
    pub fn component_overlay(&self, name: &str) -> Option<&serde_json::Value> {
        self.components.get(name)
    }
}

/// Recursively merge `overlay` into `target`.
///
/// Maps merge key-by-key; any other value kind in the overlay replaces the
/// target value wholesale.
pub fn deep_merge(target: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (target, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}
