/// Access-token blacklist.
///
/// A TTL key-value store mapping a hashed access token to a revoked marker.
/// Logout writes an entry whose TTL equals the token's remaining lifetime;
/// the gate consults it on every bearer request. Any store satisfying
/// `set`/`contains` works here — the in-memory map below, or an external
/// cache in a multi-process deployment. Entries lapse on their own; nothing
/// ever deletes them explicitly.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

#[async_trait]
pub trait BlacklistCache: Send + Sync {
    /// Mark `key` revoked for `ttl` from now.
    async fn set(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Is `key` currently marked revoked?
    async fn contains(&self, key: &str) -> Result<bool, StoreError>;
}

/// In-memory TTL map. Expired entries are purged lazily on access.
pub struct InMemoryBlacklist {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryBlacklist {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>>, StoreError>
    {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("blacklist lock poisoned".to_string()))
    }
}

impl Default for InMemoryBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlacklistCache for InMemoryBlacklist {
    async fn set(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), Utc::now() + ttl);
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let mut entries = self.lock()?;

        // Same boundary as the ledger: expired at exactly the expiry instant.
        entries.retain(|_, expires_at| now < *expires_at);

        Ok(entries.contains_key(key))
    }
}
