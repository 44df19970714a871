//! The security collaborator: value validation, value filtering, CSRF.
//!
//! [`SecurityGuard`] is the seam the kernel consumes; [`StandardGuard`] is
//! the regex-backed implementation hosts get by default. A host substitutes
//! its own guard through [`KernelContext::with_guard`].
//!
//! [`KernelContext::with_guard`]: crate::context::KernelContext::with_guard

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::csrf::{self, CsrfRejection};
use super::filters::ValueFilter;
use super::rules::{ValidationRule, Violation};
use crate::request::{BoundValue, RawRequest, Session};

// ── Compiled patterns ──────────────────────────────────────────────────────

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

static URL_ROUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9/_.~-]*$").unwrap());

// Quote-then-boolean tails, stacked keywords, comment markers.
static SQL_SUSPECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)('\s*(or|and)\b|\b(union\s+(all\s+)?select|select\s+.+\s+from|insert\s+into|delete\s+from|drop\s+(table|database)|truncate\s+table|update\s+\w+\s+set)\b|--|/\*|;\s*(select|insert|update|delete|drop)\b)",
    )
    .unwrap()
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

// ── Guard contract ─────────────────────────────────────────────────────────

/// Validation, filtering and CSRF checks consumed by the kernel.
///
/// Value checks are pure and synchronous; the request check and token mint
/// touch the caller's session and are async.
#[async_trait]
pub trait SecurityGuard: Send + Sync {
    /// Check one named value against a rule list.
    ///
    /// Returns every violation rather than stopping at the first, so a
    /// candidate's full problem list can be reported together. A missing
    /// value only violates [`ValidationRule::NotNull`]; an uploaded file is
    /// checked for presence only.
    fn check_value(
        &self,
        subject: &str,
        value: Option<&BoundValue>,
        rules: &[ValidationRule],
    ) -> Vec<Violation>;

    /// Apply a filter list to a textual value, left to right.
    fn filter_value(&self, value: &str, filters: &[ValueFilter]) -> String;

    /// CSRF check: origin against host, supplied token against session.
    async fn check_request(&self, request: &RawRequest, host: &str) -> Result<(), CsrfRejection>;

    /// Mint a fresh CSRF token into the session and return it.
    async fn mint_token(&self, session: &Session) -> String;
}

/// The default regex-backed [`SecurityGuard`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGuard;

impl StandardGuard {
    pub fn new() -> Self {
        Self
    }

    fn check_text(subject: &str, rule: &ValidationRule, text: &str) -> Option<Violation> {
        let fail = |message: String| Some(Violation::new(subject, rule.clone(), message));
        match rule {
            // presence is handled by the caller
            ValidationRule::NotNull => None,
            ValidationRule::NotEmpty => {
                if text.is_empty() {
                    fail("value is empty".into())
                } else {
                    None
                }
            }
            ValidationRule::Integer => {
                if INTEGER_RE.is_match(text) {
                    None
                } else {
                    fail(format!("'{text}' is not an integer"))
                }
            }
            ValidationRule::Positive => match text.parse::<f64>() {
                Ok(n) if n > 0.0 => None,
                Ok(n) => fail(format!("{n} is not positive")),
                Err(_) => fail(format!("'{text}' is not a number")),
            },
            ValidationRule::MinValue(bound) => match text.parse::<f64>() {
                Ok(n) if n >= *bound as f64 => None,
                Ok(n) => fail(format!("{n} is below the minimum {bound}")),
                Err(_) => fail(format!("'{text}' is not a number")),
            },
            ValidationRule::MaxValue(bound) => match text.parse::<f64>() {
                Ok(n) if n <= *bound as f64 => None,
                Ok(n) => fail(format!("{n} is above the maximum {bound}")),
                Err(_) => fail(format!("'{text}' is not a number")),
            },
            ValidationRule::MinLength(min) => {
                if text.chars().count() < *min {
                    fail(format!("shorter than {min} characters"))
                } else {
                    None
                }
            }
            ValidationRule::MaxLength(max) => {
                if text.chars().count() > *max {
                    fail(format!("longer than {max} characters"))
                } else {
                    None
                }
            }
            ValidationRule::Boolean => {
                let ok = matches!(text, "0" | "1")
                    || text.eq_ignore_ascii_case("true")
                    || text.eq_ignore_ascii_case("false");
                if ok {
                    None
                } else {
                    fail(format!("'{text}' is not a boolean"))
                }
            }
            ValidationRule::Slug => {
                if SLUG_RE.is_match(text) {
                    None
                } else {
                    fail(format!("'{text}' is not a slug"))
                }
            }
            ValidationRule::UrlRoute => {
                if URL_ROUTE_RE.is_match(text) {
                    None
                } else {
                    fail(format!("'{text}' contains characters illegal in a route"))
                }
            }
            ValidationRule::OneOf(allowed) => {
                if allowed.iter().any(|v| v == text) {
                    None
                } else {
                    fail(format!("'{text}' is not an allowed value"))
                }
            }
            ValidationRule::SqlSuspect => {
                if SQL_SUSPECT_RE.is_match(text) {
                    fail("value matches a sql injection pattern".into())
                } else {
                    None
                }
            }
        }
    }
}

#[async_trait]
impl SecurityGuard for StandardGuard {
    fn check_value(
        &self,
        subject: &str,
        value: Option<&BoundValue>,
        rules: &[ValidationRule],
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in rules {
            match value {
                None => {
                    if *rule == ValidationRule::NotNull {
                        violations.push(Violation::new(
                            subject,
                            rule.clone(),
                            "value was not received",
                        ));
                    }
                }
                // files are checked for presence only
                Some(BoundValue::File(_)) => {}
                Some(BoundValue::Text(text)) => {
                    if let Some(violation) = Self::check_text(subject, rule, text) {
                        violations.push(violation);
                    }
                }
            }
        }
        violations
    }

    fn filter_value(&self, value: &str, filters: &[ValueFilter]) -> String {
        let mut current = value.to_string();
        for filter in filters {
            current = match filter {
                ValueFilter::Trim => current.trim().to_string(),
                ValueFilter::Lowercase => current.to_lowercase(),
                ValueFilter::Uppercase => current.to_uppercase(),
                ValueFilter::StripTags => TAG_RE.replace_all(&current, "").into_owned(),
                ValueFilter::DigitsOnly => current.chars().filter(char::is_ascii_digit).collect(),
            };
        }
        current
    }

    async fn check_request(&self, request: &RawRequest, host: &str) -> Result<(), CsrfRejection> {
        csrf::verify(request, host).await
    }

    async fn mint_token(&self, session: &Session) -> String {
        csrf::mint(session).await
    }
}
