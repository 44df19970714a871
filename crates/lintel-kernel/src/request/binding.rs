//! The per-dispatch binding table.
//!
//! Descriptors are immutable registry entries; everything a single dispatch
//! learns about a request (filtered values, received flags, violations) is
//! collected here and dropped when the dispatch ends, so concurrent or
//! repeated dispatches can never leak bound values into each other.

use std::collections::{HashMap, HashSet};

use super::parameter::FilePart;
use crate::security::Violation;

/// A value bound during one dispatch: filtered text or a file descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Text(String),
    File(FilePart),
}

impl BoundValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FilePart> {
        match self {
            Self::Text(_) => None,
            Self::File(file) => Some(file),
        }
    }

    /// Stable stringification for cache-key material.
    pub fn key_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::File(file) => file.filename.clone(),
        }
    }
}

/// Values, received flags and violations for one descriptor against one
/// request. One fresh instance per candidate per dispatch.
#[derive(Debug, Default)]
pub struct BoundRequest {
    values: HashMap<String, BoundValue>,
    received: HashSet<String>,
    violations: Vec<Violation>,
}

impl BoundRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: BoundValue) {
        let name = name.into();
        self.received.insert(name.clone());
        self.values.insert(name, value);
    }

    pub(crate) fn record_violations(&mut self, violations: Vec<Violation>) {
        self.violations.extend(violations);
    }

    /// The bound value, or `None` if never received.
    pub fn value(&self, name: &str) -> Option<&BoundValue> {
        self.values.get(name)
    }

    /// The bound textual value, for the common case.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(BoundValue::as_text)
    }

    /// The bound file descriptor, for file parameters.
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.value(name).and_then(BoundValue::as_file)
    }

    /// Whether a value for this name was present in its source.
    pub fn is_received(&self, name: &str) -> bool {
        self.received.contains(name)
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True when every rule check passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}
