//! Opaque response values handed back by handlers.
//!
//! The kernel never serializes HTTP bytes itself: a [`Response`] is a
//! content-type tag plus payload plus header list, and the embedding host's
//! output layer turns it into whatever its transport needs.

use serde::{Deserialize, Serialize};

/// Content-type tag carried by a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[non_exhaustive]
pub enum ResponseKind {
    /// `application/json`
    Json,
    /// `text/html; charset=utf-8`
    Html,
    /// `text/plain; charset=utf-8`
    #[default]
    Text,
    /// `application/octet-stream`
    Binary,
}

impl ResponseKind {
    /// The MIME type the host should put on the wire for this kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseKind::Json => "application/json",
            ResponseKind::Html => "text/html; charset=utf-8",
            ResponseKind::Text => "text/plain; charset=utf-8",
            ResponseKind::Binary => "application/octet-stream",
        }
    }
}

/// The opaque output of a handled action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Response {
    /// Content-type tag; the host maps it to a transport content type.
    pub kind: ResponseKind,
    /// Raw payload bytes.
    pub body: Vec<u8>,
    /// Extra headers the handler wants forwarded, in insertion order.
    pub headers: Vec<(String, String)>,
}

impl Response {
    /// An empty text response.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Text,
            body: body.into().into_bytes(),
            headers: Vec::new(),
        }
    }

    /// An HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Html,
            body: body.into().into_bytes(),
            headers: Vec::new(),
        }
    }

    /// A JSON response serialized from any `Serialize` value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: ResponseKind::Json,
            body: serde_json::to_vec(value)?,
            headers: Vec::new(),
        })
    }

    /// A binary response.
    pub fn binary(body: Vec<u8>) -> Self {
        Self {
            kind: ResponseKind::Binary,
            body,
            headers: Vec::new(),
        }
    }

    /// Append a header (builder style).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The payload as UTF-8 text (lossy), mainly for CLI output and tests.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
