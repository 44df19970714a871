//! Lintel kernel — lazy component registry and request dispatch engine.
//!
//! The kernel turns one incoming request (HTTP or command-line) into exactly
//! one executed handler, or a well-defined "not found" outcome.  It owns the
//! in-process decision logic only: hosting, templating and persistence live
//! in the crates that embed it.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              lintel-kernel  (this crate)                    │
//! │  ComponentCatalog + ComponentRegistry   (lazy load-once)    │
//! │  RouteDescriptor / PathSegment / Parameter  (matching)      │
//! │  ActionRegistry + run_action  (execution state machine)     │
//! │  Dispatcher  (registration-order fallthrough)               │
//! │  SecurityGuard / ResponseCache  (collaborator traits)       │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  embedded by
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              lintel-server  (host crate)                    │
//! │  axum HTTP entry    clap CLI entry                          │
//! │  bootstrap (catalog + config)    core `status` component    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use lintel_kernel::component::{ComponentCatalog, ComponentSpec, Origin};
//! use lintel_kernel::request::{PathSegment, RawRequest, RouteDescriptor};
//! use lintel_kernel::action::ActionDescriptor;
//! use lintel_kernel::{Dispatcher, KernelConfig, KernelContext};
//!
//! let mut catalog = ComponentCatalog::new();
//! catalog.register(
//!     ComponentSpec::new("status", Origin::Core, || Box::new(StatusComponent::default()))
//!         .with_actions(|actions| {
//!             actions.register(ActionDescriptor::new(
//!                 "status.health",
//!                 "status",
//!                 "health",
//!                 RouteDescriptor::new(vec![PathSegment::fixed("status")]),
//!             ))
//!         }),
//! )?;
//!
//! let context = KernelContext::new(catalog, KernelConfig::default())?;
//! let dispatcher = Dispatcher::new(context);
//! let outcome = dispatcher.dispatch(&RawRequest::http("/status")).await?;
//! ```
//!
//! One dispatch runs: tokenize path → collect structurally matching actions →
//! bind and validate each candidate's values → execute candidates in
//! registration order until one handles the request.

pub mod action;
pub mod cache;
pub mod component;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod response;
pub mod security;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use action::{run_action, ActionDescriptor, ActionPolicy, ActionRegistry, HandlerOutcome};
pub use cache::{MemoryCache, ResponseCache};
pub use component::{
    Component, ComponentCatalog, ComponentContext, ComponentRegistry, ComponentResult,
    ComponentSpec, Origin,
};
pub use config::KernelConfig;
pub use context::KernelContext;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{KernelError, KernelResult};
pub use request::{BoundRequest, BoundValue, Parameter, PathSegment, RawRequest, RouteDescriptor};
pub use response::{Response, ResponseKind};
pub use security::{SecurityGuard, StandardGuard};
