/// Refresh Token Ledger
///
/// Mutation rules for the per-user collection of refresh tokens:
/// - token values are 64-character cryptographically random strings; only
///   their SHA-256 hash is ever stored
/// - a hash match against a revoked or expired entry is a miss, not an
///   error, so validity state does not leak through error channels
/// - entries are revoked in place (rotation, logout) and never deleted;
///   the retained rows are the replay-detection audit trail
///
/// Persistence belongs to the credential store's save path; these functions
/// only transform the in-memory ledger of one user aggregate.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const REFRESH_TOKEN_LENGTH: usize = 64;

/// One ledger entry. Value type owned by its user; no identity beyond the
/// hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Expired at exactly the expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_revoked()
    }
}

/// Generate a new opaque refresh-token value.
///
/// 64 characters from the alphanumeric alphabet, drawn from the thread-local
/// CSPRNG. The plaintext goes to the client; the server keeps the hash.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a token value.
///
/// Shared by the ledger and the access-token blacklist key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash `raw` and append an active entry valid for `validity_days`.
pub fn issue(
    ledger: &mut Vec<RefreshToken>,
    raw: &str,
    validity_days: i64,
    now: DateTime<Utc>,
) -> RefreshToken {
    let entry = RefreshToken {
        token_hash: hash_token(raw),
        created_at: now,
        expires_at: now + Duration::days(validity_days),
        revoked_at: None,
    };
    ledger.push(entry.clone());
    entry
}

/// Find the entry matching `raw`, but only while it is active.
pub fn find_active<'a>(
    ledger: &'a [RefreshToken],
    raw: &str,
    now: DateTime<Utc>,
) -> Option<&'a RefreshToken> {
    let token_hash = hash_token(raw);
    ledger
        .iter()
        .find(|entry| entry.token_hash == token_hash && entry.is_active(now))
}

/// Mark the entry with `token_hash` revoked. Idempotent: an already-revoked
/// entry keeps its original revocation instant.
pub fn revoke(ledger: &mut [RefreshToken], token_hash: &str, now: DateTime<Utc>) {
    if let Some(entry) = ledger
        .iter_mut()
        .find(|entry| entry.token_hash == token_hash && !entry.is_revoked())
    {
        entry.revoked_at = Some(now);
    }
}

/// Revoke every live entry (logout everywhere, password reset).
pub fn revoke_all(ledger: &mut [RefreshToken], now: DateTime<Utc>) {
    for entry in ledger.iter_mut().filter(|entry| !entry.is_revoked()) {
        entry.revoked_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_token_hashing() {
        let token = generate_refresh_token();
        let hash1 = hash_token(&token);
        let hash2 = hash_token(&token);

        // Same token should produce same hash
        assert_eq!(hash1, hash2);
        // Hash should not equal plaintext
        assert_ne!(token, hash1);
        // Hash should be 64 chars (SHA-256 hex)
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_tokens_different_hashes() {
        assert_ne!(
            hash_token(&generate_refresh_token()),
            hash_token(&generate_refresh_token())
        );
    }

    #[test]
    fn issue_appends_an_active_entry() {
        let mut ledger = Vec::new();
        let raw = generate_refresh_token();
        let now = Utc::now();

        let entry = issue(&mut ledger, &raw, 30, now);

        assert_eq!(ledger.len(), 1);
        assert!(entry.is_active(now));
        assert_eq!(entry.token_hash, hash_token(&raw));
        assert_eq!(entry.expires_at, now + Duration::days(30));
    }

    #[test]
    fn find_active_returns_the_matching_live_entry() {
        let mut ledger = Vec::new();
        let raw = generate_refresh_token();
        let now = Utc::now();
        issue(&mut ledger, &raw, 30, now);

        assert!(find_active(&ledger, &raw, now).is_some());
        assert!(find_active(&ledger, "some-other-value", now).is_none());
    }

    #[test]
    fn revoked_entry_is_a_miss_not_an_error() {
        let mut ledger = Vec::new();
        let raw = generate_refresh_token();
        let now = Utc::now();
        let entry = issue(&mut ledger, &raw, 30, now);
        let token_hash = entry.token_hash;

        revoke(&mut ledger, &token_hash, now);

        assert!(find_active(&ledger, &raw, now).is_none());
        // The entry itself is retained for audit
        assert_eq!(ledger.len(), 1);
        assert!(ledger[0].is_revoked());
    }

    #[test]
    fn entry_expiring_exactly_now_is_a_miss() {
        let mut ledger = Vec::new();
        let raw = generate_refresh_token();
        let now = Utc::now();
        issue(&mut ledger, &raw, 30, now);

        let at_expiry = now + Duration::days(30);
        assert!(find_active(&ledger, &raw, at_expiry).is_none());
        assert!(find_active(&ledger, &raw, at_expiry - Duration::seconds(1)).is_some());
    }

    #[test]
    fn revoke_is_idempotent() {
        let mut ledger = Vec::new();
        let raw = generate_refresh_token();
        let now = Utc::now();
        let entry = issue(&mut ledger, &raw, 30, now);
        let token_hash = entry.token_hash;

        revoke(&mut ledger, &token_hash, now);
        let first_revocation = ledger[0].revoked_at;

        revoke(&mut ledger, &token_hash, now + Duration::seconds(10));

        assert_eq!(ledger[0].revoked_at, first_revocation);
    }

    #[test]
    fn revoke_all_leaves_no_live_entries() {
        let mut ledger = Vec::new();
        let now = Utc::now();
        for _ in 0..3 {
            issue(&mut ledger, &generate_refresh_token(), 30, now);
        }

        revoke_all(&mut ledger, now);

        assert!(ledger.iter().all(|entry| entry.is_revoked()));
        assert_eq!(ledger.len(), 3);
    }
}
