//! The result cache boundary.
//!
//! The kernel owns key construction ([`build_key`]) and the envelope format
//! ([`CachedOutcome`]); storage semantics belong to the [`ResponseCache`]
//! implementation. The cache is best effort and never a source of truth:
//! callers treat read/write failures as misses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

use crate::action::HandlerOutcome;
use crate::response::Response;

pub mod memory;
pub use memory::MemoryCache;

/// Errors surfaced by a cache provider or the envelope codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The backing store failed (connection refused, full, …).
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A stored envelope could not be encoded or decoded.
    #[error("cache codec error: {source}")]
    Codec {
        #[from]
        source: bincode::Error,
    },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Opaque string-keyed byte store with per-entry TTL.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Fetch a value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value. A zero TTL means the entry never expires.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Drop a value. Returns whether the key existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
}

/// The kernel's key-building convention: `prefix:` plus the SHA-256 hex of
/// the key material. Identical material always yields an identical key.
pub fn build_key(prefix: &str, material: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    let digest = hasher.finalize();
    format!("{prefix}:{digest:x}")
}

/// What an action stores: its productivity flag plus the response, if any.
///
/// Serialized with bincode. A stored `handled = false` short-circuits a later
/// run to "declined" without invoking the target method, exactly as a stored
/// `handled = true` short-circuits to its stored response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedOutcome {
    pub handled: bool,
    pub response: Option<Response>,
}

impl CachedOutcome {
    pub fn from_outcome(outcome: &HandlerOutcome) -> Self {
        match outcome {
            HandlerOutcome::Handled(response) => Self {
                handled: true,
                response: Some(response.clone()),
            },
            HandlerOutcome::Declined => Self {
                handled: false,
                response: None,
            },
        }
    }

    pub fn into_outcome(self) -> HandlerOutcome {
        if self.handled {
            HandlerOutcome::Handled(self.response.unwrap_or_default())
        } else {
            HandlerOutcome::Declined
        }
    }

    pub fn encode(&self) -> CacheResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> CacheResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
