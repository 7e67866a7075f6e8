/// Session Lifecycle Routes
///
/// HTTP entry points for the four engine operations — login, refresh,
/// logout, and the protected session echo — plus the password-reset pair.
/// Handlers stay thin: decode the request, call the engine, shape the
/// response. Error mapping lives on `AppError`.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{Claims, Role};
use crate::error::AppError;
use crate::session::SessionEngine;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub identifier: String,
}

#[derive(Deserialize)]
pub struct PasswordResetCompletion {
    pub token: String,
    pub new_password: String,
}

/// Token bundle returned by login and refresh
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: String,
}

#[derive(Serialize)]
pub struct AckResponse {
    pub status: &'static str,
}

/// Session details for the protected echo endpoint
#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub role: String,
    pub expires_at: String,
}

/// POST /auth/login
///
/// Authenticate with a login identifier (username, email, or phone), a
/// password, and the role the session is opened as. The account must
/// already hold that role.
///
/// # Errors
/// - 400: identifier fails validation
/// - 401: unknown identifier, role not held, or wrong password — one
///   indistinguishable error for all three
pub async fn login(
    form: web::Json<LoginRequest>,
    engine: web::Data<SessionEngine>,
) -> Result<HttpResponse, AppError> {
    let bundle = engine
        .login(&form.identifier, &form.password, form.role)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: bundle.access_token,
        refresh_token: bundle.refresh_token,
        token_type: "Bearer".to_string(),
        expires_at: bundle.expires_at.to_rfc3339(),
    }))
}

/// POST /auth/refresh
///
/// Exchange an access/refresh pair for a new one. The access token may be
/// expired (its signature still has to hold); the refresh token is rotated
/// and its consumed value never works again.
///
/// # Errors
/// - 401: bad access-token signature, or unknown/expired/revoked refresh
///   token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    engine: web::Data<SessionEngine>,
) -> Result<HttpResponse, AppError> {
    let bundle = engine
        .refresh(&form.access_token, &form.refresh_token)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: bundle.access_token,
        refresh_token: bundle.refresh_token,
        token_type: "Bearer".to_string(),
        expires_at: bundle.expires_at.to_rfc3339(),
    }))
}

/// POST /auth/logout
///
/// Revoke the refresh token and blacklist the access token for its
/// remaining lifetime, so the gate denies it from now on.
pub async fn logout(
    form: web::Json<LogoutRequest>,
    engine: web::Data<SessionEngine>,
) -> Result<HttpResponse, AppError> {
    engine.logout(&form.access_token, &form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(AckResponse { status: "logged_out" }))
}

/// POST /auth/password-reset/request
///
/// Start a password reset. Responds 202 whether or not the identifier
/// matches an account.
pub async fn request_password_reset(
    form: web::Json<PasswordResetRequest>,
    engine: web::Data<SessionEngine>,
) -> Result<HttpResponse, AppError> {
    engine.request_password_reset(&form.identifier).await?;

    Ok(HttpResponse::Accepted().json(AckResponse { status: "accepted" }))
}

/// POST /auth/password-reset/complete
///
/// Finish a password reset with the delivered token. Revokes every
/// outstanding refresh token for the account.
pub async fn reset_password(
    form: web::Json<PasswordResetCompletion>,
    engine: web::Data<SessionEngine>,
) -> Result<HttpResponse, AppError> {
    engine.reset_password(&form.token, &form.new_password).await?;

    Ok(HttpResponse::Ok().json(AckResponse { status: "password_reset" }))
}

/// GET /api/session
///
/// Echo the authenticated session. Claims are injected by the JWT
/// middleware; reaching this handler means the token passed the gate and
/// full validation.
pub async fn session_info(claims: web::ReqData<Claims>) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let role: Role = claims.role()?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        user_id: user_id.to_string(),
        role: role.to_string(),
        expires_at: claims.expires_at().to_rfc3339(),
    }))
}
