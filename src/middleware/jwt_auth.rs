/// JWT Authentication Middleware
///
/// Full validation for protected scopes: signature against the allow-list,
/// time window, and role-claim extraction. Valid claims are injected into
/// request extensions for route handlers. Runs after the revocation gate,
/// which has already dealt with blacklisted tokens.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::verify_access_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

pub struct JwtAuth {
    jwt_config: JwtSettings,
}

impl JwtAuth {
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self { jwt_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").map(|t| t.trim().to_string()));

        let service = self.service.clone();
        let jwt_config = self.jwt_config.clone();

        Box::pin(async move {
            let token = auth_header.ok_or_else(|| {
                Error::from(AppError::from(AuthError::Unauthorized(
                    "missing bearer token",
                )))
            })?;

            let claims = verify_access_token(&token, &jwt_config).map_err(Error::from)?;
            // Surface an unrecognized role here, not in every handler.
            claims.role().map_err(Error::from)?;

            tracing::debug!(user_id = %claims.sub, role = %claims.role, "JWT validated");
            req.extensions_mut().insert(claims);

            service.call(req).await
        })
    }
}
