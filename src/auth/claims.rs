/// JWT Claims structure
///
/// Payload of an access token: subject, login role, and the registered
/// claims (RFC 7519) the verifier pins.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::role::Role;
use crate::error::{AppError, AuthError};

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Role the session was opened as. Kept as a string so that an
    /// unrecognized value surfaces at extraction time, not as a serde
    /// failure buried inside signature verification.
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp, equals `iat`)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Unique token id, random per mint
    pub jti: String,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        role: Role,
        expiry_seconds: i64,
        issuer: String,
        audience: String,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now,
            nbf: now,
            exp: now + expiry_seconds,
            iss: issuer,
            aud: audience,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Extract the subject as a UUID.
    ///
    /// # Errors
    /// Returns `MalformedToken` if the subject is not a valid UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| {
            AuthError::MalformedToken(format!("subject is not a UUID: {}", self.sub)).into()
        })
    }

    /// Extract the role claim as a validated `Role`.
    ///
    /// # Errors
    /// Returns `MalformedToken` for an unrecognized role string
    pub fn role(&self) -> Result<Role, AppError> {
        self.role.parse()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }

    /// A token is already expired at exactly its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
