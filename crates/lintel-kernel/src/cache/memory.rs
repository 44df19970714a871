//! In-process cache provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheResult, ResponseCache};

struct Entry {
    value: Vec<u8>,
    // None = never expires
    deadline: Option<Instant>,
}

/// The default [`ResponseCache`]: a TTL-aware in-process map.
///
/// Expiry is lazy: an expired entry is dropped on the read that finds it.
/// Uses the tokio clock so TTL behavior is testable under a paused runtime.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, counting not-yet-collected expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) => {
                    let expired = entry.deadline.is_some_and(|d| Instant::now() >= d);
                    if !expired {
                        return Ok(Some(entry.value.clone()));
                    }
                }
            }
        }
        // expired: collect under the write lock
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let deadline = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, deadline });
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
