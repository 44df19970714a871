//! The closed set of validation rules and the violations they produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One validation rule attachable to a path segment or parameter.
///
/// The set is closed: handlers pick from these, they never supply ad-hoc
/// predicates. Rules that inspect content are skipped for values that were
/// never received; only [`ValidationRule::NotNull`] fires on absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValidationRule {
    /// The value must have been received.
    NotNull,
    /// The value must be a non-empty string.
    NotEmpty,
    /// The value must be an integer (optional leading sign).
    Integer,
    /// The value must parse as a number greater than zero.
    Positive,
    /// The value must parse as a number `>=` the bound.
    MinValue(i64),
    /// The value must parse as a number `<=` the bound.
    MaxValue(i64),
    /// The value must be at least this many characters long.
    MinLength(usize),
    /// The value must be at most this many characters long.
    MaxLength(usize),
    /// The value must be a boolean literal (`0`, `1`, `true`, `false`).
    Boolean,
    /// Lowercase letters, digits and single hyphens (`my-page-2`).
    Slug,
    /// Characters legal inside a URL route (`[A-Za-z0-9/_.~-]`).
    UrlRoute,
    /// The value must be one of the listed literals.
    OneOf(Vec<String>),
    /// The value must not look like a SQL injection attempt.
    SqlSuspect,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNull => write!(f, "not-null"),
            Self::NotEmpty => write!(f, "not-empty"),
            Self::Integer => write!(f, "integer"),
            Self::Positive => write!(f, "positive"),
            Self::MinValue(n) => write!(f, "min-value:{n}"),
            Self::MaxValue(n) => write!(f, "max-value:{n}"),
            Self::MinLength(n) => write!(f, "min-length:{n}"),
            Self::MaxLength(n) => write!(f, "max-length:{n}"),
            Self::Boolean => write!(f, "boolean"),
            Self::Slug => write!(f, "slug"),
            Self::UrlRoute => write!(f, "url-route"),
            Self::OneOf(values) => write!(f, "one-of:{}", values.join(",")),
            Self::SqlSuspect => write!(f, "sql-suspect"),
        }
    }
}

/// A human-readable record of one failed rule check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// The symbolic name of the value that failed.
    pub subject: String,
    /// The rule that rejected it.
    pub rule: ValidationRule,
    /// What went wrong, phrased for a log line.
    pub message: String,
}

impl Violation {
    pub fn new(
        subject: impl Into<String>,
        rule: ValidationRule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.subject, self.rule, self.message)
    }
}
