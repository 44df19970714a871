//! Actions: named operations dispatchable against components.
//!
//! An [`ActionDescriptor`] ties a dotted action name to the component and
//! method that serve it, the [`RouteDescriptor`](crate::RouteDescriptor)
//! shape it answers to, and an execution [`ActionPolicy`]. Descriptors are
//! registered once at bootstrap and immutable afterwards; execution walks
//! the [`run_action`] pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::Origin;
use crate::request::{BoundRequest, RouteDescriptor};
use crate::response::{Response, ResponseKind};

pub mod exec;
pub mod registry;

pub use exec::run_action;
pub use registry::ActionRegistry;

/// What a handler did with a request it was offered.
///
/// `Declined` means the handler looked and chose not to produce a response;
/// the dispatcher then tries the next matching candidate. Errors are a
/// separate channel entirely and abort dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Handled(Response),
    Declined,
}

impl HandlerOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, HandlerOutcome::Handled(_))
    }
}

/// Execution policy attached to one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPolicy {
    /// Serve repeat requests from the response cache.
    pub cache: bool,
    /// Cache-key prefix; the kernel default applies when unset.
    pub cache_prefix: Option<String>,
    /// Entry lifetime in seconds; the kernel default applies when unset.
    /// Zero means the entry never expires.
    pub cache_ttl_secs: Option<u64>,
    /// Only requests arriving through the CLI entry point may run this.
    pub cli_only: bool,
    /// Impose a randomized delay after a declined run, for endpoints worth
    /// protecting from rapid guessing.
    pub brute_force_guard: bool,
    /// Hard wall-clock limit for one execution, in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Registration-time action failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("action name must not be empty")]
    EmptyName,

    #[error("action {0} names no component")]
    EmptyComponent(String),

    #[error("action {0} names no method")]
    EmptyMethod(String),

    #[error("action already registered: {0}")]
    DuplicateAction(String),

    #[error("action {action} timed out after {timeout_ms}ms")]
    Timeout { action: String, timeout_ms: u64 },
}

/// One registered action: the name clients invoke, the component method that
/// serves it, the request shape it answers and its execution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Dotted action name, e.g. `user.show`.
    pub name: String,
    pub component: String,
    pub origin: Origin,
    /// Method name passed to the component's `invoke`.
    pub method: String,
    pub route: RouteDescriptor,
    pub response_kind: ResponseKind,
    pub policy: ActionPolicy,
}

impl ActionDescriptor {
    pub fn new(
        name: impl Into<String>,
        component: impl Into<String>,
        method: impl Into<String>,
        route: RouteDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            origin: Origin::App,
            method: method.into(),
            route,
            response_kind: ResponseKind::default(),
            policy: ActionPolicy::default(),
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }

    pub fn cached(mut self) -> Self {
        self.policy.cache = true;
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.policy.cache_prefix = Some(prefix.into());
        self
    }

    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.policy.cache_ttl_secs = Some(secs);
        self
    }

    pub fn cli_only(mut self) -> Self {
        self.policy.cli_only = true;
        self
    }

    pub fn brute_force_guarded(mut self) -> Self {
        self.policy.brute_force_guard = true;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.policy.timeout_ms = Some(timeout_ms);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ActionError> {
        if self.name.trim().is_empty() {
            return Err(ActionError::EmptyName);
        }
        if self.component.trim().is_empty() {
            return Err(ActionError::EmptyComponent(self.name.clone()));
        }
        if self.method.trim().is_empty() {
            return Err(ActionError::EmptyMethod(self.name.clone()));
        }
        Ok(())
    }

    /// Cache key for one binding, using this action's effective prefix.
    ///
    /// Registration guarantees cached actions carry a concrete prefix, so
    /// the fallback only covers descriptors built outside a registry.
    pub fn cache_key(&self, binding: &BoundRequest) -> String {
        let prefix = self.policy.cache_prefix.as_deref().unwrap_or(&self.name);
        self.route.cache_key(prefix, binding)
    }
}
