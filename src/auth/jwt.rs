/// Token Codec
///
/// Mints and verifies signed JWTs. Pure functions of claims + key material;
/// no I/O. Verification pins the issuer, the audience, and an explicit
/// algorithm allow-list (tokens signed with anything outside the list are
/// rejected regardless of key validity). The time-window check is done by
/// hand with zero leeway so that `now >= exp` means expired everywhere in
/// the engine, and so that refresh/logout can run a signature-only check on
/// an already-expired token.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::role::Role;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// A freshly minted access token with its validity window.
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mint a new access token for a user acting as `role`.
pub fn mint_access_token(
    user_id: &Uuid,
    role: Role,
    config: &JwtSettings,
) -> Result<IssuedAccessToken, AppError> {
    let algorithm = *config
        .algorithms()?
        .first()
        .ok_or_else(|| AppError::Internal("empty algorithm allow-list".to_string()))?;

    let claims = Claims::new(
        *user_id,
        role,
        config.access_token_expiry,
        config.issuer.clone(),
        config.audience.clone(),
    );

    let token = encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok(IssuedAccessToken {
        token,
        issued_at: timestamp(claims.iat),
        expires_at: timestamp(claims.exp),
    })
}

/// Decode the claim set without any signature or time checks.
///
/// Used where only the *structure* matters (the inbound gate). Anything that
/// does not decode is a `MalformedToken`.
pub fn decode_unverified(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::MalformedToken(e.to_string()).into())
}

/// Verify signature, algorithm, issuer, and audience — but not the time
/// window. Refresh and logout must trust the role claim of an access token
/// that has already expired.
pub fn verify_signature_only(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let algorithms = config.algorithms()?;
    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms;
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| classify_decode_error(e))
}

/// Full verification: signature checks plus the `[nbf, exp)` window.
pub fn verify_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let claims = verify_signature_only(token, config)?;

    let now = Utc::now().timestamp();
    if now < claims.nbf {
        return Err(AuthError::Unauthorized("token not yet valid").into());
    }
    if now >= claims.exp {
        return Err(AuthError::Unauthorized("token expired").into());
    }

    Ok(claims)
}

fn classify_decode_error(e: jsonwebtoken::errors::Error) -> AppError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::MalformedToken(e.to_string()).into(),
        _ => {
            tracing::warn!("JWT verification error: {}", e);
            AuthError::Unauthorized("token verification failed").into()
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            issuer: "test".to_string(),
            audience: "test-clients".to_string(),
            access_token_expiry: 900,
            refresh_token_days: 30,
            allowed_algorithms: vec!["HS256".to_string()],
        }
    }

    #[test]
    fn mint_and_verify_round_trip() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let issued =
            mint_access_token(&user_id, Role::User, &config).expect("failed to mint token");
        let claims = verify_access_token(&issued.token, &config).expect("failed to verify token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role().unwrap(), Role::User);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.aud, "test-clients");
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let config = get_test_config();
        let issued = mint_access_token(&Uuid::new_v4(), Role::User, &config)
            .expect("failed to mint token");

        let mut other = get_test_config();
        other.secret = "another-secret-key-also-32-characters-plus".to_string();

        assert!(verify_access_token(&issued.token, &other).is_err());
        assert!(verify_signature_only(&issued.token, &other).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = get_test_config();
        let issued = mint_access_token(&Uuid::new_v4(), Role::User, &config)
            .expect("failed to mint token");

        let tampered = format!("{}X", issued.token);
        assert!(verify_access_token(&tampered, &config).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let config = get_test_config();
        let issued = mint_access_token(&Uuid::new_v4(), Role::User, &config)
            .expect("failed to mint token");

        let mut other = get_test_config();
        other.issuer = "someone-else".to_string();

        assert!(verify_access_token(&issued.token, &other).is_err());
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let config = get_test_config();
        let issued = mint_access_token(&Uuid::new_v4(), Role::User, &config)
            .expect("failed to mint token");

        let mut other = get_test_config();
        other.audience = "other-clients".to_string();

        assert!(verify_access_token(&issued.token, &other).is_err());
    }

    #[test]
    fn algorithm_outside_the_allow_list_is_rejected() {
        let config = get_test_config();
        let claims = Claims::new(
            Uuid::new_v4(),
            Role::User,
            900,
            config.issuer.clone(),
            config.audience.clone(),
        );

        // Signed with the right key but a disallowed algorithm.
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("failed to encode");

        assert!(verify_access_token(&token, &config).is_err());
        assert!(verify_signature_only(&token, &config).is_err());
    }

    #[test]
    fn expired_token_passes_signature_only_but_fails_full_verification() {
        let config = get_test_config();
        let mut claims = Claims::new(
            Uuid::new_v4(),
            Role::Installer,
            900,
            config.issuer.clone(),
            config.audience.clone(),
        );
        claims.iat -= 3600;
        claims.nbf -= 3600;
        claims.exp -= 3600;

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("failed to encode");

        let recovered =
            verify_signature_only(&token, &config).expect("signature-only should pass");
        assert_eq!(recovered.role().unwrap(), Role::Installer);

        assert!(verify_access_token(&token, &config).is_err());
    }

    #[test]
    fn token_is_invalid_at_exactly_its_expiry_instant() {
        let config = get_test_config();
        let mut claims = Claims::new(
            Uuid::new_v4(),
            Role::User,
            900,
            config.issuer.clone(),
            config.audience.clone(),
        );
        // exp == now; `now >= exp` must hold however fast the check runs.
        claims.exp = Utc::now().timestamp();

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("failed to encode");

        assert!(verify_access_token(&token, &config).is_err());
    }

    #[test]
    fn unverified_decode_reads_structure_without_the_key() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();
        let issued =
            mint_access_token(&user_id, Role::Administrator, &config).expect("failed to mint");

        let claims = decode_unverified(&issued.token).expect("structure should decode");
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn garbage_is_a_malformed_token() {
        for garbage in ["", "not-a-jwt", "a.b", "a.b.c.d"] {
            match decode_unverified(garbage) {
                Err(AppError::Auth(AuthError::MalformedToken(_))) => (),
                other => panic!("expected MalformedToken for {:?}, got {:?}", garbage, other),
            }
        }
    }
}
