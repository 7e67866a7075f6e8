/// Unified Error Handling Module
///
/// One error system for the whole engine:
/// 1. Domain-specific error types (validation, authentication, storage, config)
/// 2. A central `AppError` used for control flow
/// 3. HTTP response mapping with structured bodies
/// 4. Structured error logging with request correlation
///
/// Authentication failures are deliberately lossy towards the caller: the
/// external message never reveals whether the account existed, the role was
/// missing, or the password was wrong. Logs carry the precise reason.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for caller-supplied input
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Why a login was denied. Never shown to the caller; logged only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDenyReason {
    UnknownIdentifier,
    RoleNotHeld,
    InvalidPassword,
}

/// Authentication and session-lifecycle errors
///
/// `Display` renders the *external* message. Internal detail lives in the
/// variant payloads and is only emitted through `log_error`.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Login denied. External message is identical for every reason.
    LoginFailed(LoginDenyReason),
    /// Refresh denied: bad access-token signature, or an unknown, expired,
    /// or revoked refresh token.
    RefreshFailed(&'static str),
    /// Logout denied, same causes as refresh.
    LogoutFailed(&'static str),
    /// Password-reset token unknown, expired, or already used.
    PasswordResetFailed(&'static str),
    /// JWT structure could not be decoded (distinct from signature failure).
    MalformedToken(String),
    /// Gate rejection: missing, malformed, or blacklisted token.
    Unauthorized(&'static str),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::LoginFailed(_) => write!(f, "invalid identifier or password"),
            AuthError::RefreshFailed(_)
            | AuthError::LogoutFailed(_)
            | AuthError::PasswordResetFailed(_) => write!(f, "invalid session"),
            AuthError::MalformedToken(_) => write!(f, "malformed token"),
            AuthError::Unauthorized(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for AuthError {}

/// Storage collaborator errors
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Optimistic version check failed: the record changed underneath us.
    Conflict,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict => write!(f, "record version conflict"),
            StoreError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Configuration errors (fatal at startup)
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Auth(AuthError),
    Store(StoreError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

// ============================================================================
// HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for log correlation
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn response_parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }

            AppError::Auth(e) => match e {
                AuthError::LoginFailed(_) => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    e.to_string(),
                ),
                AuthError::RefreshFailed(_)
                | AuthError::LogoutFailed(_)
                | AuthError::PasswordResetFailed(_) => {
                    (StatusCode::UNAUTHORIZED, "SESSION_INVALID", e.to_string())
                }
                AuthError::MalformedToken(_) => {
                    (StatusCode::UNAUTHORIZED, "TOKEN_MALFORMED", e.to_string())
                }
                AuthError::Unauthorized(_) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string())
                }
            },

            // Storage trouble is never the caller's fault; respond generically.
            AppError::Store(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    /// Log with full internal detail. The response body stays generic.
    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Auth(AuthError::LoginFailed(reason)) => {
                tracing::warn!(
                    error_id = error_id,
                    reason = ?reason,
                    "Login denied"
                );
            }
            AppError::Auth(AuthError::RefreshFailed(detail)) => {
                tracing::warn!(error_id = error_id, detail = detail, "Refresh denied");
            }
            AppError::Auth(AuthError::LogoutFailed(detail)) => {
                tracing::warn!(error_id = error_id, detail = detail, "Logout denied");
            }
            AppError::Auth(AuthError::PasswordResetFailed(detail)) => {
                tracing::warn!(error_id = error_id, detail = detail, "Password reset denied");
            }
            AppError::Auth(AuthError::MalformedToken(detail)) => {
                tracing::warn!(error_id = error_id, detail = %detail, "Malformed token");
            }
            AppError::Auth(AuthError::Unauthorized(detail)) => {
                tracing::warn!(error_id = error_id, detail = detail, "Request rejected by gate");
            }
            AppError::Store(e) => {
                tracing::error!(error_id = error_id, error = %e, "Storage error");
            }
            AppError::Config(e) => {
                tracing::error!(error_id = error_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, code, message) = self.response_parts();
        let body = ErrorResponse::new(error_id, message, code.to_string(), status.as_u16());

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.response_parts().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_share_one_external_message() {
        let a = AuthError::LoginFailed(LoginDenyReason::UnknownIdentifier);
        let b = AuthError::LoginFailed(LoginDenyReason::RoleNotHeld);
        let c = AuthError::LoginFailed(LoginDenyReason::InvalidPassword);

        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(b.to_string(), c.to_string());
    }

    #[test]
    fn refresh_and_logout_collapse_to_invalid_session() {
        let refresh = AuthError::RefreshFailed("refresh token already revoked");
        let logout = AuthError::LogoutFailed("no matching refresh token");

        assert_eq!(refresh.to_string(), "invalid session");
        assert_eq!(logout.to_string(), "invalid session");
    }

    #[test]
    fn auth_errors_map_to_401() {
        let err: AppError = AuthError::Unauthorized("token revoked").into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: AppError = AuthError::LoginFailed(LoginDenyReason::InvalidPassword).into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_errors_do_not_leak_detail() {
        let err: AppError = StoreError::Unavailable("connection refused to 10.0.0.3".into()).into();
        let (status, _, message) = err.response_parts();

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!message.contains("10.0.0.3"));
    }

    #[test]
    fn error_response_carries_correlation_fields() {
        let response = ErrorResponse::new(
            "err-123".to_string(),
            "nope".to_string(),
            "TEST".to_string(),
            400,
        );

        assert_eq!(response.error_id, "err-123");
        assert_eq!(response.code, "TEST");
        assert_eq!(response.status, 400);
    }
}
