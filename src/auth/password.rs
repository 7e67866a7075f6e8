/// Password Hashing Capability
///
/// The engine never touches a concrete hash algorithm; it talks to the
/// `PasswordHasher` trait so any credential backend can substitute its own
/// scheme. The default implementation uses bcrypt and enforces the strength
/// rules below before hashing.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Pluggable password hashing and verification.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password, validating strength first.
    fn hash_password(&self, password: &str) -> Result<String, AppError>;

    /// Verify a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

/// bcrypt-backed implementation with the default cost factor.
pub struct BcryptHasher;

impl PasswordHasher for BcryptHasher {
    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        validate_password_strength(password)?;

        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AppError> {
        verify(password, stored_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

/// Requirements:
/// - 8 to 128 characters
/// - At least one digit, one lowercase letter, and one uppercase letter
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    // bcrypt truncates long inputs; cap them outright
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hashed = BcryptHasher
            .hash_password(password)
            .expect("Failed to hash password");

        assert_ne!(password, hashed);
        assert!(hashed.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let password = "ValidPassword123";
        let hashed = BcryptHasher
            .hash_password(password)
            .expect("Failed to hash password");

        let is_valid = BcryptHasher
            .verify_password(password, &hashed)
            .expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hashed = BcryptHasher
            .hash_password("ValidPassword123")
            .expect("Failed to hash password");

        let is_valid = BcryptHasher
            .verify_password("WrongPassword123", &hashed)
            .expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_too_short_password() {
        assert!(BcryptHasher.hash_password("Short1").is_err());
    }

    #[test]
    fn test_too_long_password() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1) + "A1";
        assert!(BcryptHasher.hash_password(&long_password).is_err());
    }

    #[test]
    fn test_missing_character_classes() {
        assert!(BcryptHasher.hash_password("NoDigitsPassword").is_err());
        assert!(BcryptHasher.hash_password("NOLOWERCASE1").is_err());
        assert!(BcryptHasher.hash_password("nouppercase1").is_err());
    }
}
