/// Login-identifier validation.
///
/// A login identifier may be a username, an email address, or a phone
/// number; the credential store decides which one actually matches. This
/// module only rejects input that can be no identifier at all (length
/// abuse, control characters, shapes that fit none of the three forms).

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_IDENTIFIER_LENGTH: usize = 254; // RFC 5321 upper bound for emails
const MIN_IDENTIFIER_LENGTH: usize = 3;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // E.164-ish phone numbers, 7 to 15 digits with an optional leading +
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();

    // Usernames: word characters plus dot and dash
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]{2,63}$").unwrap();
}

/// Validates a login identifier and returns its trimmed form.
pub fn is_valid_identifier(identifier: &str) -> Result<String, ValidationError> {
    let trimmed = identifier.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("identifier".to_string()));
    }

    if trimmed.len() < MIN_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooShort(
            "identifier".to_string(),
            MIN_IDENTIFIER_LENGTH,
        ));
    }

    if trimmed.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(
            "identifier".to_string(),
            MAX_IDENTIFIER_LENGTH,
        ));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("identifier".to_string()));
    }

    if EMAIL_REGEX.is_match(trimmed)
        || PHONE_REGEX.is_match(trimmed)
        || USERNAME_REGEX.is_match(trimmed)
    {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidFormat("identifier".to_string()))
    }
}
