//! Cross-site request forgery protection.
//!
//! A request passes the CSRF check when its `Origin` header (if any) names
//! this server's host and the supplied `csrf_token` parameter equals the
//! token held in the caller's session. Tokens are minted per session and
//! appended to generated URLs by [`RouteDescriptor::build_url_with_csrf`].
//!
//! [`RouteDescriptor::build_url_with_csrf`]: crate::request::RouteDescriptor::build_url_with_csrf

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::request::{RawRequest, Session};

/// Name of the request parameter carrying the token.
pub const CSRF_PARAM: &str = "csrf_token";

/// Session key the minted token is stored under.
pub const SESSION_TOKEN_KEY: &str = "csrf_token";

const TOKEN_LEN: usize = 40;

/// Why a CSRF check rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CsrfRejection {
    /// The `Origin` header names a different host than this server.
    OriginMismatch { origin: String, host: String },
    /// No `csrf_token` parameter was supplied.
    TokenMissing,
    /// The supplied token does not match the session token.
    TokenMismatch,
    /// The caller's session holds no token to compare against.
    SessionMissing,
}

impl fmt::Display for CsrfRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OriginMismatch { origin, host } => {
                write!(f, "origin '{origin}' does not match host '{host}'")
            }
            Self::TokenMissing => write!(f, "no csrf token supplied"),
            Self::TokenMismatch => write!(f, "csrf token does not match session"),
            Self::SessionMissing => write!(f, "session holds no csrf token"),
        }
    }
}

/// Verify the request against the configured server host.
///
/// A missing `Origin` header passes the origin check: non-browser callers
/// (curl, the CLI entry) do not send one, and the token comparison is the
/// actual proof of intent.
pub async fn verify(request: &RawRequest, host: &str) -> Result<(), CsrfRejection> {
    if let Some(origin) = request.header("origin") {
        let origin_host = host_part(origin);
        if !origin_host.eq_ignore_ascii_case(host.trim()) {
            return Err(CsrfRejection::OriginMismatch {
                origin: origin.to_string(),
                host: host.to_string(),
            });
        }
    }

    let supplied = request
        .body
        .get(CSRF_PARAM)
        .or_else(|| request.query.get(CSRF_PARAM))
        .or_else(|| request.cli_args.get(CSRF_PARAM));
    let Some(supplied) = supplied else {
        return Err(CsrfRejection::TokenMissing);
    };

    let Some(held) = request.session.get(SESSION_TOKEN_KEY).await else {
        return Err(CsrfRejection::SessionMissing);
    };

    if *supplied != held {
        return Err(CsrfRejection::TokenMismatch);
    }
    Ok(())
}

/// Mint a fresh token and store it in the session.
pub async fn mint(session: &Session) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    session.set(SESSION_TOKEN_KEY, token.clone()).await;
    token
}

// "https://example.com:8080/path" -> "example.com:8080"
fn host_part(origin: &str) -> &str {
    let rest = origin.split_once("://").map_or(origin, |(_, r)| r);
    rest.split_once('/').map_or(rest, |(h, _)| h)
}
