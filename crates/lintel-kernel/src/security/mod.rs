//! Security collaborators: validation rules, value filters, CSRF.
//!
//! The kernel consumes security through the [`SecurityGuard`] trait; rule and
//! filter identifiers are closed enums so descriptors declare what they need
//! and nothing else. [`StandardGuard`] is the default implementation.

pub mod csrf;
pub mod filters;
pub mod guard;
pub mod rules;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use csrf::{CsrfRejection, CSRF_PARAM, SESSION_TOKEN_KEY};
pub use filters::ValueFilter;
pub use guard::{SecurityGuard, StandardGuard};
pub use rules::{ValidationRule, Violation};
