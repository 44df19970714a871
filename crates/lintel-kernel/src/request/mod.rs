//! Request shapes and their matching/extraction logic.
//!
//! A [`RouteDescriptor`] is the declarative shape an action expects: an
//! ordered list of [`PathSegment`]s, a list of [`Parameter`]s, a CSRF flag
//! and extra cache-key entries. Descriptors are immutable once registered;
//! everything learned about a concrete request during one dispatch lands in
//! a per-call [`BoundRequest`].
//!
//! ```text
//!   "/user/5?sort=asc"
//!        │ tokenize
//!        ▼
//!   ["user", "5"] ──matches_path──▶ [Fixed("user"), Numeric("id")]
//!        │ bind (filter + validate, collect all violations)
//!        ▼
//!   BoundRequest { id = "5", sort = "asc", violations: [] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cache;
use crate::security::csrf::CsrfRejection;
use crate::security::{SecurityGuard, ValidationRule, CSRF_PARAM};

pub mod binding;
pub mod incoming;
pub mod parameter;
pub mod path;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use binding::{BoundRequest, BoundValue};
pub use incoming::{tokenize_path, EntryPoint, RawRequest, Session};
pub use parameter::{FilePart, ParamSource, Parameter};
pub use path::PathSegment;

/// Options for [`RouteDescriptor::build_url`].
#[derive(Debug, Clone, Default)]
pub struct UrlOptions {
    /// Append query-source parameters found in the value map.
    pub include_query: bool,
    /// Scheme-and-host prefix, e.g. `https://example.com`.
    pub base: Option<String>,
}

/// The declarative request shape one action expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Ordered path segments; immutable after registration.
    pub segments: Vec<PathSegment>,
    /// Declared inputs outside the path.
    pub parameters: Vec<Parameter>,
    /// Whether dispatching this shape demands a CSRF check.
    pub csrf_required: bool,
    /// Extra entries mixed into the cache key, in declaration order.
    pub cache_extra: Vec<String>,
}

impl RouteDescriptor {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self {
            segments,
            parameters: Vec::new(),
            csrf_required: false,
            cache_extra: Vec::new(),
        }
    }

    /// A descriptor for the root path (zero segments).
    pub fn root() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn require_csrf(mut self) -> Self {
        self.csrf_required = true;
        self
    }

    pub fn with_cache_extra(mut self, entry: impl Into<String>) -> Self {
        self.cache_extra.push(entry.into());
        self
    }

    /// Structural test against a tokenized path.
    ///
    /// True iff both sides have zero segments, or both have the same
    /// non-zero count and every segment matches the token at its index.
    /// Differing counts never match, regardless of content.
    pub fn matches_path(&self, tokens: &[String]) -> bool {
        if self.segments.len() != tokens.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(tokens)
            .all(|(segment, token)| segment.matches(token))
    }

    /// Extract and validate every declared value into a fresh binding table.
    ///
    /// A failed check records a violation but never aborts the pass: all
    /// segments and parameters are processed so the whole problem list can
    /// be reported together. The caller decides what a non-empty violation
    /// list means (the dispatcher skips the candidate).
    pub fn bind(&self, request: &RawRequest, guard: &dyn SecurityGuard) -> BoundRequest {
        let tokens = request.tokens();
        let mut bound = BoundRequest::new();

        for (index, segment) in self.segments.iter().enumerate() {
            let Some(name) = segment.name() else {
                continue;
            };
            let Some(raw) = tokens.get(index) else {
                continue;
            };
            let filtered = guard.filter_value(raw, segment.filters());
            bound.insert(name, BoundValue::Text(filtered));

            let rules = with_global_rules(segment.rules());
            let violations = guard.check_value(name, bound.value(name), &rules);
            bound.record_violations(violations);
        }

        for param in &self.parameters {
            let text_source = match param.source {
                ParamSource::Query => Some(&request.query),
                ParamSource::Body => Some(&request.body),
                ParamSource::Cli => Some(&request.cli_args),
                ParamSource::File => None,
            };
            match text_source {
                Some(map) => {
                    if let Some(raw) = map.get(&param.name) {
                        let filtered = guard.filter_value(raw, &param.filters);
                        bound.insert(&param.name, BoundValue::Text(filtered));
                    }
                    let rules = with_global_rules(&param.rules);
                    let violations =
                        guard.check_value(&param.name, bound.value(&param.name), &rules);
                    bound.record_violations(violations);
                }
                None => {
                    // files bypass filters; presence rules only
                    if let Some(file) = request.files.get(&param.name) {
                        bound.insert(&param.name, BoundValue::File(file.clone()));
                    }
                    let violations =
                        guard.check_value(&param.name, bound.value(&param.name), &param.rules);
                    bound.record_violations(violations);
                }
            }
        }

        bound
    }

    /// Render this shape back into a literal path.
    ///
    /// Fixed literals are emitted as-is; variables take their value from the
    /// map or fall back to a `{name}` placeholder. Values are inserted
    /// verbatim, so callers supply them already encoded for their transport.
    pub fn build_url(&self, values: &HashMap<String, String>, options: &UrlOptions) -> String {
        let mut url = String::new();
        if let Some(base) = &options.base {
            url.push_str(base.trim_end_matches('/'));
        }

        if self.segments.is_empty() {
            url.push('/');
        }
        for segment in &self.segments {
            url.push('/');
            let part = segment
                .name()
                .and_then(|name| values.get(name).cloned())
                .unwrap_or_else(|| segment.placeholder());
            url.push_str(&part);
        }

        if options.include_query {
            let pairs: Vec<String> = self
                .parameters
                .iter()
                .filter(|p| p.source == ParamSource::Query)
                .filter_map(|p| values.get(&p.name).map(|v| format!("{}={v}", p.name)))
                .collect();
            if !pairs.is_empty() {
                url.push('?');
                url.push_str(&pairs.join("&"));
            }
        }

        url
    }

    /// [`build_url`](Self::build_url), appending a freshly-minted CSRF token
    /// when this descriptor requires CSRF protection.
    pub async fn build_url_with_csrf(
        &self,
        values: &HashMap<String, String>,
        options: &UrlOptions,
        guard: &dyn SecurityGuard,
        session: &Session,
    ) -> String {
        let mut url = self.build_url(values, options);
        if self.csrf_required {
            let token = guard.mint_token(session).await;
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(CSRF_PARAM);
            url.push('=');
            url.push_str(&token);
        }
        url
    }

    /// Deterministic cache-key material for this shape under one binding:
    /// segment values/placeholders, then `name=value` parameter pairs, then
    /// the extra entries, all in declaration order, passed through the cache
    /// key-building convention.
    pub fn cache_key(&self, prefix: &str, binding: &BoundRequest) -> String {
        let mut material = String::new();
        for segment in &self.segments {
            let part = segment
                .name()
                .and_then(|name| binding.value(name))
                .map(BoundValue::key_string)
                .unwrap_or_else(|| segment.placeholder());
            material.push_str(&part);
            material.push('/');
        }
        material.push('|');
        for param in &self.parameters {
            material.push_str(&param.name);
            material.push('=');
            if let Some(value) = binding.value(&param.name) {
                material.push_str(&value.key_string());
            }
            material.push('&');
        }
        material.push('|');
        for extra in &self.cache_extra {
            material.push_str(extra);
            material.push('&');
        }
        cache::build_key(prefix, &material)
    }

    /// The CSRF gate: a no-op unless this descriptor requires protection.
    pub async fn security_check(
        &self,
        request: &RawRequest,
        guard: &dyn SecurityGuard,
        host: &str,
    ) -> Result<(), CsrfRejection> {
        if !self.csrf_required {
            return Ok(());
        }
        guard.check_request(request, host).await
    }
}

// The globally-fixed rule set every textual value is screened with, on top
// of whatever the descriptor declares.
fn with_global_rules(declared: &[ValidationRule]) -> Vec<ValidationRule> {
    let mut rules = declared.to_vec();
    if !rules.contains(&ValidationRule::SqlSuspect) {
        rules.push(ValidationRule::SqlSuspect);
    }
    rules
}
