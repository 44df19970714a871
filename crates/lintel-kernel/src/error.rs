//! Crate-level error types for `lintel-kernel`.
//!
//! Provides a unified [`KernelError`] that composes errors from every
//! sub-module (component, action, cache, config, IO, serialization) together
//! with [`error_stack::Report`] for rich, context-carrying error propagation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lintel_kernel::error::{KernelError, KernelResult};
//! use error_stack::ResultExt;
//!
//! fn boot() -> KernelResult<()> {
//!     // Errors from sub-modules convert automatically via From impls.
//!     // Attach extra context with .change_context() / .attach().
//!     let raw = std::fs::read_to_string("lintel.toml")
//!         .map_err(KernelError::from)
//!         .map_err(error_stack::Report::new)
//!         .attach("loading lintel.toml")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::action::ActionError;
use crate::cache::CacheError;
use crate::component::ComponentError;
use crate::config::ConfigError;

/// Crate-level error type for `lintel-kernel`.
///
/// Wraps each sub-module's typed error via `#[from]` so that the `?`
/// operator converts them automatically. Use
/// [`error_stack::Report<KernelError>`] (via [`KernelResult`]) to attach
/// human-readable context as the error propagates up the call stack.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// An error originating from the component registry or a component.
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// An action definition or execution error.
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// A cache collaborator error.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// A configuration-related error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal / untyped error described by a message string.
    #[error("{0}")]
    Internal(String),
}

impl KernelError {
    /// Whether this error is unrecoverable for the owning process.
    ///
    /// A missing or failed-to-initialize component, a dependency cycle, and a
    /// mapped-but-nonexistent target method all abort the process after an
    /// orderly shutdown. Everything else (timeouts, cache faults, config
    /// problems surfaced at boot) is reported without killing a running host.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KernelError::Component(
                ComponentError::NotFound { .. }
                    | ComponentError::Unknown(_)
                    | ComponentError::InitFailed { .. }
                    | ComponentError::DependencyCycle { .. }
                    | ComponentError::UnknownMethod { .. }
            )
        )
    }
}

/// Convenience result alias using [`error_stack::Report`].
///
/// Equivalent to `Result<T, error_stack::Report<KernelError>>`.
pub type KernelResult<T> = Result<T, error_stack::Report<KernelError>>;
