//! Named inputs sourced from outside the path.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::security::{ValidationRule, ValueFilter};

/// Where a parameter's raw value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamSource {
    /// URL query string.
    Query,
    /// Form-encoded request body.
    Body,
    /// Uploaded file descriptor.
    File,
    /// Command-line argument map.
    Cli,
}

/// One declared input: a symbolic name, its source, and the rules and
/// filters applied when it is retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub source: ParamSource,
    pub rules: Vec<ValidationRule>,
    pub filters: Vec<ValueFilter>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, source: ParamSource) -> Self {
        Self {
            name: name.into(),
            source,
            rules: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::Query)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::Body)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::File)
    }

    pub fn cli(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::Cli)
    }

    /// Attach validation rules (builder style).
    pub fn with_rules(mut self, extra: Vec<ValidationRule>) -> Self {
        self.rules.extend(extra);
        self
    }

    /// Attach value filters (builder style). Filters never apply to files.
    pub fn with_filters(mut self, extra: Vec<ValueFilter>) -> Self {
        self.filters.extend(extra);
        self
    }
}

/// Descriptor of one uploaded file, as handed over by the host.
///
/// The kernel only inspects metadata; payload staging is the host's problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    /// Where the host staged the payload, if it did.
    pub path: Option<PathBuf>,
}

impl FilePart {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}
