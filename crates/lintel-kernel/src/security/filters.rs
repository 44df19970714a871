//! The closed set of value filters.
//!
//! Filters rewrite a textual value before validation runs. They never apply
//! to uploaded files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One value filter attachable to a path segment or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValueFilter {
    /// Strip leading and trailing whitespace.
    Trim,
    /// Lowercase the value.
    Lowercase,
    /// Uppercase the value.
    Uppercase,
    /// Remove anything that looks like an HTML/XML tag.
    StripTags,
    /// Keep ASCII digits only.
    DigitsOnly,
}

impl fmt::Display for ValueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trim => write!(f, "trim"),
            Self::Lowercase => write!(f, "lowercase"),
            Self::Uppercase => write!(f, "uppercase"),
            Self::StripTags => write!(f, "strip-tags"),
            Self::DigitsOnly => write!(f, "digits-only"),
        }
    }
}
