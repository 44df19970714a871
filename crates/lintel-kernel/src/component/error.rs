//! Component-layer failures.

use thiserror::Error;

use super::Origin;

/// Everything that can go wrong while resolving, initializing or tearing
/// down components.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ComponentError {
    #[error("component not found: {name} (origin: {origin})")]
    NotFound { name: String, origin: Origin },

    #[error("component not found in any origin: {0}")]
    Unknown(String),

    #[error("component already registered: {name}")]
    Duplicate { name: String },

    #[error("component init failed: {name}: {reason}")]
    InitFailed { name: String, reason: String },

    #[error("dependency cycle: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("component {component} has no method {method}")]
    UnknownMethod { component: String, method: String },

    #[error("component {component} asked for undeclared dependency {dependency}")]
    UndeclaredDependency {
        component: String,
        dependency: String,
    },

    #[error("component teardown failed: {name}: {reason}")]
    TeardownFailed { name: String, reason: String },

    #[error("component I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("component serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("component error: {0}")]
    Other(String),
}

pub type ComponentResult<T> = Result<T, ComponentError>;
