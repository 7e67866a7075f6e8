use jsonwebtoken::Algorithm;
use std::str::FromStr;

use crate::error::ConfigError;

/// Minimum signing-key length. Anything shorter than the HS256 block size
/// weakens the MAC.
const MIN_SECRET_LENGTH: usize = 32;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

/// Token issuance settings. Loaded once at startup, immutable afterwards.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry: i64, // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_days: i64,  // days (e.g., 30)
    pub allowed_algorithms: Vec<String>,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct NotifierSettings {
    /// Endpoint of the notification relay. Absent means log-only delivery.
    pub base_url: Option<String>,
}

impl JwtSettings {
    /// Parse the configured algorithm allow-list.
    ///
    /// # Errors
    /// Returns error if the list is empty or contains an unknown name.
    pub fn algorithms(&self) -> Result<Vec<Algorithm>, ConfigError> {
        if self.allowed_algorithms.is_empty() {
            return Err(ConfigError::MissingRequired(
                "jwt.allowed_algorithms".to_string(),
            ));
        }

        self.allowed_algorithms
            .iter()
            .map(|name| {
                Algorithm::from_str(name).map_err(|_| {
                    ConfigError::InvalidValue(format!("unknown signing algorithm: {}", name))
                })
            })
            .collect()
    }

    /// Reject unusable settings before the server starts serving requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.audience".to_string()));
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.refresh_token_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.refresh_token_days must be positive".to_string(),
            ));
        }
        self.algorithms()?;

        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let settings = settings
        .try_deserialize::<Settings>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    settings.jwt.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            issuer: "authgate".to_string(),
            audience: "authgate-clients".to_string(),
            access_token_expiry: 900,
            refresh_token_days: 30,
            allowed_algorithms: vec!["HS256".to_string()],
        }
    }

    #[test]
    fn valid_settings_pass_validation() {
        assert!(valid_jwt_settings().validate().is_ok());
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut settings = valid_jwt_settings();
        settings.secret = "too-short".to_string();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_length_validity_windows_are_rejected() {
        let mut settings = valid_jwt_settings();
        settings.access_token_expiry = 0;
        assert!(settings.validate().is_err());

        let mut settings = valid_jwt_settings();
        settings.refresh_token_days = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn empty_algorithm_list_is_rejected() {
        let mut settings = valid_jwt_settings();
        settings.allowed_algorithms.clear();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn unknown_algorithm_name_is_rejected() {
        let mut settings = valid_jwt_settings();
        settings.allowed_algorithms = vec!["HS256".to_string(), "NONE".to_string()];

        assert!(settings.validate().is_err());
    }

    #[test]
    fn algorithm_names_parse_into_the_allow_list() {
        let settings = valid_jwt_settings();
        let algorithms = settings.algorithms().expect("should parse");

        assert_eq!(algorithms, vec![Algorithm::HS256]);
    }
}
