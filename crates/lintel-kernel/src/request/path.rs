//! One segment of an expected request path.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::security::{ValidationRule, ValueFilter};

// Accepts an optional sign and one decimal part: "42", "-7", "3.14".
static NUMERIC_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// A fixed literal or typed variable at one path position.
///
/// Segments are immutable once registered. A matched variable's value lives
/// in the per-dispatch [`BoundRequest`], never on the segment itself, so one
/// descriptor can serve concurrent dispatches.
///
/// [`BoundRequest`]: crate::request::BoundRequest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PathSegment {
    /// Matches exactly one literal, case-insensitively. Never binds a value.
    Fixed { literal: String },
    /// Matches any token; binds it under `name`.
    Text {
        name: String,
        rules: Vec<ValidationRule>,
        filters: Vec<ValueFilter>,
    },
    /// Matches numeric tokens only; binds under `name`.
    Numeric {
        name: String,
        rules: Vec<ValidationRule>,
        filters: Vec<ValueFilter>,
    },
}

impl PathSegment {
    pub fn fixed(literal: impl Into<String>) -> Self {
        Self::Fixed {
            literal: literal.into(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            rules: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::Numeric {
            name: name.into(),
            rules: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Attach validation rules (builder style). Ignored for fixed segments.
    pub fn with_rules(mut self, extra: Vec<ValidationRule>) -> Self {
        if let Self::Text { rules, .. } | Self::Numeric { rules, .. } = &mut self {
            rules.extend(extra);
        }
        self
    }

    /// Attach value filters (builder style). Ignored for fixed segments.
    pub fn with_filters(mut self, extra: Vec<ValueFilter>) -> Self {
        if let Self::Text { filters, .. } | Self::Numeric { filters, .. } = &mut self {
            filters.extend(extra);
        }
        self
    }

    /// Structural test of one incoming token against this segment.
    pub fn matches(&self, token: &str) -> bool {
        match self {
            Self::Fixed { literal } => literal.eq_ignore_ascii_case(token),
            Self::Text { .. } => true,
            Self::Numeric { .. } => NUMERIC_TOKEN_RE.is_match(token),
        }
    }

    pub fn is_variable(&self) -> bool {
        !matches!(self, Self::Fixed { .. })
    }

    /// The binding name, for variable segments.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Fixed { .. } => None,
            Self::Text { name, .. } | Self::Numeric { name, .. } => Some(name),
        }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        match self {
            Self::Fixed { .. } => &[],
            Self::Text { rules, .. } | Self::Numeric { rules, .. } => rules,
        }
    }

    pub fn filters(&self) -> &[ValueFilter] {
        match self {
            Self::Fixed { .. } => &[],
            Self::Text { filters, .. } | Self::Numeric { filters, .. } => filters,
        }
    }

    /// What this segment renders as when no value is supplied: the literal
    /// for fixed segments, `{name}` for variables.
    pub fn placeholder(&self) -> String {
        match self {
            Self::Fixed { literal } => literal.clone(),
            Self::Text { name, .. } | Self::Numeric { name, .. } => format!("{{{name}}}"),
        }
    }
}
