/// Credential Store collaborator.
///
/// The engine consumes user records through this trait; the backing
/// technology is deliberately out of scope. `save` carries the concurrency
/// contract the rotation invariant depends on: it must reject a write from
/// a stale snapshot so that two racing read-modify-write cycles on the same
/// user cannot both win.
///
/// The in-memory implementation is the spec's single-writer-per-process
/// variant; a database-backed implementation would map `save` onto a
/// transaction with a version column.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::user::UserRecord;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Resolve a login identifier: username, then email, then phone —
    /// first match wins.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Index lookup: which user owns the refresh token with this hash?
    async fn find_by_refresh_hash(&self, token_hash: &str)
        -> Result<Option<UserRecord>, StoreError>;

    /// Index lookup for outstanding password-reset tokens.
    async fn find_by_reset_hash(&self, token_hash: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError>;

    /// Persist a mutated record. Fails with `StoreError::Conflict` when the
    /// stored version no longer matches the snapshot's; increments the
    /// version on success.
    async fn save(&self, record: &UserRecord) -> Result<(), StoreError>;
}

/// Mutexed-map store for tests and single-process deployments.
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, UserRecord>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Unavailable("credential store lock poisoned".to_string()))
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.lock()?;

        let hit = users
            .values()
            .find(|u| u.username == identifier)
            .or_else(|| {
                users
                    .values()
                    .find(|u| u.email.eq_ignore_ascii_case(identifier))
            })
            .or_else(|| users.values().find(|u| u.phone == identifier));

        Ok(hit.cloned())
    }

    async fn find_by_refresh_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let users = self.lock()?;
        Ok(users
            .values()
            .find(|u| u.refresh_tokens.iter().any(|t| t.token_hash == token_hash))
            .cloned())
    }

    async fn find_by_reset_hash(&self, token_hash: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.lock()?;
        Ok(users
            .values()
            .find(|u| {
                u.reset_token
                    .as_ref()
                    .map(|t| t.token_hash == token_hash)
                    .unwrap_or(false)
            })
            .cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        if users.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        users.insert(record.id, record);
        Ok(())
    }

    async fn save(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut users = self.lock()?;

        let stored = users.get_mut(&record.id).ok_or(StoreError::Conflict)?;
        if stored.version != record.version {
            return Err(StoreError::Conflict);
        }

        let mut updated = record.clone();
        updated.version += 1;
        *stored = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{refresh_token, Role};
    use chrono::Utc;

    fn sample_user() -> UserRecord {
        UserRecord::new(
            "pat",
            "pat@example.com",
            "+821055512345",
            "$2b$12$hash",
            vec![Role::User],
        )
    }

    #[tokio::test]
    async fn resolves_username_email_and_phone() {
        let store = InMemoryCredentialStore::new();
        let user = sample_user();
        let id = user.id;
        store.insert(user).await.expect("insert failed");

        for identifier in ["pat", "pat@example.com", "PAT@EXAMPLE.COM", "+821055512345"] {
            let found = store
                .find_by_identifier(identifier)
                .await
                .expect("lookup failed")
                .unwrap_or_else(|| panic!("no match for {}", identifier));
            assert_eq!(found.id, id);
        }

        assert!(store
            .find_by_identifier("nobody")
            .await
            .expect("lookup failed")
            .is_none());
    }

    #[tokio::test]
    async fn save_bumps_the_version() {
        let store = InMemoryCredentialStore::new();
        let user = sample_user();
        let id = user.id;
        store.insert(user).await.expect("insert failed");

        let snapshot = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(snapshot.version, 0);
        store.save(&snapshot).await.expect("save failed");

        let reloaded = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(reloaded.version, 1);
    }

    #[tokio::test]
    async fn stale_snapshot_cannot_be_saved() {
        let store = InMemoryCredentialStore::new();
        let user = sample_user();
        let id = user.id;
        store.insert(user).await.expect("insert failed");

        let first = store.find_by_id(id).await.unwrap().unwrap();
        let second = store.find_by_id(id).await.unwrap().unwrap();

        store.save(&first).await.expect("first save should win");

        match store.save(&second).await {
            Err(StoreError::Conflict) => (),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_hash_index_finds_the_owner() {
        let store = InMemoryCredentialStore::new();
        let mut user = sample_user();
        let id = user.id;
        let raw = refresh_token::generate_refresh_token();
        refresh_token::issue(&mut user.refresh_tokens, &raw, 30, Utc::now());
        store.insert(user).await.expect("insert failed");

        let owner = store
            .find_by_refresh_hash(&refresh_token::hash_token(&raw))
            .await
            .expect("lookup failed")
            .expect("owner not found");
        assert_eq!(owner.id, id);

        assert!(store
            .find_by_refresh_hash("unknown-hash")
            .await
            .expect("lookup failed")
            .is_none());
    }
}
