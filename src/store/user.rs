/// User aggregate as seen by the engine.
///
/// The record exclusively owns its refresh-token ledger and the single
/// outstanding password-reset slot. `version` backs the store's optimistic
/// concurrency check: every successful save increments it, and a save from
/// a stale snapshot is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{RefreshToken, Role};

/// Hashed single-use password-reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl ResetToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at && self.used_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub refresh_tokens: Vec<RefreshToken>,
    pub reset_token: Option<ResetToken>,
    pub version: u64,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            phone: phone.into(),
            password_hash: password_hash.into(),
            roles,
            refresh_tokens: Vec::new(),
            reset_token: None,
            version: 0,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
