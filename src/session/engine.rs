/// Session Engine
///
/// Orchestrates the session state machine — Anonymous → Authenticated →
/// Revoked — against the credential store, the refresh-token ledger rules,
/// the token codec, and the blacklist cache.
///
/// All ledger mutation goes through a load → mutate → versioned-save loop.
/// On a version conflict the mutation re-runs against the fresh record,
/// which is what enforces rotation exclusivity: the losing side of a
/// refresh race reloads, finds the consumed token already revoked, and
/// fails instead of issuing a second pair.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{self, refresh_token, PasswordHasher, Role};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, LoginDenyReason, StoreError};
use crate::notifier::Notifier;
use crate::store::{BlacklistCache, CredentialStore, ResetToken};
use crate::store::UserRecord;
use crate::validators::is_valid_identifier;

/// Bounded retries for the optimistic save loop.
const SAVE_RETRY_LIMIT: usize = 3;

/// A blacklist entry for a token at the edge of expiry still needs a
/// positive TTL to take effect.
const BLACKLIST_TTL_FLOOR_SECS: i64 = 5;

const RESET_TOKEN_VALIDITY_HOURS: i64 = 1;

/// What a successful login or refresh hands back to the caller.
#[derive(Debug, Clone)]
pub struct AccessTokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionEngine {
    store: Arc<dyn CredentialStore>,
    blacklist: Arc<dyn BlacklistCache>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn Notifier>,
    jwt: JwtSettings,
}

impl SessionEngine {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        blacklist: Arc<dyn BlacklistCache>,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn Notifier>,
        jwt: JwtSettings,
    ) -> Self {
        Self {
            store,
            blacklist,
            hasher,
            notifier,
            jwt,
        }
    }

    pub fn jwt_settings(&self) -> &JwtSettings {
        &self.jwt
    }

    /// Authenticate `identifier` with `password`, signing in as
    /// `requested_role`.
    ///
    /// The account must already hold the requested role: the three client
    /// surfaces share one credential store but refuse cross-role sign-in.
    /// Unknown identifier, missing role, and wrong password all map to the
    /// same external error; logs carry the distinction.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        requested_role: Role,
    ) -> Result<AccessTokenBundle, AppError> {
        let identifier = is_valid_identifier(identifier)?;

        let user = self
            .store
            .find_by_identifier(&identifier)
            .await?
            .ok_or(AuthError::LoginFailed(LoginDenyReason::UnknownIdentifier))?;

        if !user.has_role(requested_role) {
            return Err(AuthError::LoginFailed(LoginDenyReason::RoleNotHeld).into());
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AuthError::LoginFailed(LoginDenyReason::InvalidPassword).into());
        }

        let raw_refresh = auth::generate_refresh_token();
        let refresh_days = self.jwt.refresh_token_days;
        self.mutate_user(user.id, |record| {
            refresh_token::issue(
                &mut record.refresh_tokens,
                &raw_refresh,
                refresh_days,
                Utc::now(),
            );
            Ok(())
        })
        .await?;

        let issued = auth::mint_access_token(&user.id, requested_role, &self.jwt)?;

        tracing::info!(
            user_id = %user.id,
            role = %requested_role,
            "Login succeeded"
        );

        Ok(AccessTokenBundle {
            access_token: issued.token,
            refresh_token: raw_refresh,
            expires_at: issued.expires_at,
        })
    }

    /// Exchange a (possibly expired) access token plus a live refresh token
    /// for a new pair.
    ///
    /// The access token only needs a valid signature — expiry is expected
    /// here — and contributes the role for the new pair. The refresh token
    /// is consumed: it is revoked in the same persisted step that issues
    /// its replacement, so a concurrent second use loses.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token_value: &str,
    ) -> Result<AccessTokenBundle, AppError> {
        let claims = auth::verify_signature_only(access_token, &self.jwt)
            .map_err(|_| AuthError::RefreshFailed("access token signature rejected"))?;
        let role = claims.role()?;

        let consumed_hash = auth::hash_token(refresh_token_value);
        let owner = self
            .store
            .find_by_refresh_hash(&consumed_hash)
            .await?
            .ok_or(AuthError::RefreshFailed("unknown refresh token"))?;

        let new_raw = auth::generate_refresh_token();
        let refresh_days = self.jwt.refresh_token_days;
        self.mutate_user(owner.id, |record| {
            let now = Utc::now();
            let matched = refresh_token::find_active(&record.refresh_tokens, refresh_token_value, now)
                .map(|entry| entry.token_hash.clone())
                .ok_or(AuthError::RefreshFailed("refresh token expired or revoked"))?;

            refresh_token::revoke(&mut record.refresh_tokens, &matched, now);
            refresh_token::issue(&mut record.refresh_tokens, &new_raw, refresh_days, now);
            Ok(())
        })
        .await?;

        let issued = auth::mint_access_token(&owner.id, role, &self.jwt)?;

        tracing::info!(user_id = %owner.id, role = %role, "Session refreshed");

        Ok(AccessTokenBundle {
            access_token: issued.token,
            refresh_token: new_raw,
            expires_at: issued.expires_at,
        })
    }

    /// Close a session: revoke the refresh token and blacklist the access
    /// token for whatever lifetime it has left.
    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token_value: &str,
    ) -> Result<(), AppError> {
        let claims = auth::verify_signature_only(access_token, &self.jwt)
            .map_err(|_| AuthError::LogoutFailed("access token signature rejected"))?;

        let token_hash = auth::hash_token(refresh_token_value);
        let owner = self
            .store
            .find_by_refresh_hash(&token_hash)
            .await?
            .ok_or(AuthError::LogoutFailed("unknown refresh token"))?;

        let now = Utc::now();
        self.mutate_user(owner.id, |record| {
            refresh_token::revoke(&mut record.refresh_tokens, &token_hash, now);
            Ok(())
        })
        .await?;

        // The ledger change lands first; the blacklist write makes the
        // still-signature-valid access token unusable at the gate.
        let remaining = claims.exp - now.timestamp();
        let ttl = Duration::seconds(remaining.max(BLACKLIST_TTL_FLOOR_SECS));
        self.blacklist
            .set(&auth::hash_token(access_token), ttl)
            .await?;

        tracing::info!(user_id = %owner.id, "Logout completed");
        Ok(())
    }

    /// The gate's core check, run on every bearer request: reject empty or
    /// structurally undecodable tokens, then reject anything blacklisted.
    /// Signature and expiry belong to the full-validation path.
    pub async fn authorize(&self, bearer_token: &str) -> Result<(), AppError> {
        let token = bearer_token.trim();
        if token.is_empty() {
            return Err(AuthError::Unauthorized("empty bearer token").into());
        }

        if auth::decode_unverified(token).is_err() {
            return Err(AuthError::Unauthorized("malformed bearer token").into());
        }

        if self.blacklist.contains(&auth::hash_token(token)).await? {
            return Err(AuthError::Unauthorized("token revoked").into());
        }

        Ok(())
    }

    /// Start a password reset. Always reports success to the caller; an
    /// unknown identifier is only visible in the logs.
    pub async fn request_password_reset(&self, identifier: &str) -> Result<(), AppError> {
        let identifier = is_valid_identifier(identifier)?;

        let user = match self.store.find_by_identifier(&identifier).await? {
            Some(user) => user,
            None => {
                tracing::info!("Password reset requested for unknown identifier");
                return Ok(());
            }
        };

        let raw = Uuid::new_v4().to_string();
        let token_hash = auth::hash_token(&raw);
        let now = Utc::now();

        self.mutate_user(user.id, |record| {
            record.reset_token = Some(ResetToken {
                token_hash: token_hash.clone(),
                expires_at: now + Duration::hours(RESET_TOKEN_VALIDITY_HOURS),
                used_at: None,
            });
            Ok(())
        })
        .await?;

        // Delivery trouble is the notifier's to log, not the caller's to see.
        let recipient = if user.email.is_empty() {
            user.phone.clone()
        } else {
            user.email.clone()
        };
        self.notifier
            .send(
                &recipient,
                "Password reset",
                &format!("Your password reset code: {}", raw),
            )
            .await;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(())
    }

    /// Complete a password reset: single-use token, new hash, and every
    /// outstanding refresh token revoked.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let token_hash = auth::hash_token(token);

        let user = self
            .store
            .find_by_reset_hash(&token_hash)
            .await?
            .ok_or(AuthError::PasswordResetFailed("unknown reset token"))?;

        let new_hash = self.hasher.hash_password(new_password)?;
        let now = Utc::now();

        self.mutate_user(user.id, |record| {
            let slot = record
                .reset_token
                .as_mut()
                .ok_or(AuthError::PasswordResetFailed("reset token no longer present"))?;

            if slot.token_hash != token_hash || !slot.is_usable(now) {
                return Err(
                    AuthError::PasswordResetFailed("reset token expired or already used").into(),
                );
            }

            slot.used_at = Some(now);
            record.password_hash = new_hash.clone();
            refresh_token::revoke_all(&mut record.refresh_tokens, now);
            Ok(())
        })
        .await?;

        tracing::info!(user_id = %user.id, "Password reset completed; all sessions revoked");
        Ok(())
    }

    /// Load → mutate → save with the store's optimistic version check.
    /// A conflict re-runs the mutation against the fresh record.
    async fn mutate_user<F>(&self, user_id: Uuid, mut mutate: F) -> Result<(), AppError>
    where
        F: FnMut(&mut UserRecord) -> Result<(), AppError>,
    {
        for _ in 0..SAVE_RETRY_LIMIT {
            let mut user = self.store.find_by_id(user_id).await?.ok_or_else(|| {
                AppError::Store(StoreError::Unavailable("user record vanished".to_string()))
            })?;

            mutate(&mut user)?;

            match self.store.save(&user).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict.into())
    }
}
