/// Inbound revocation gate
///
/// Runs before every request. A request without a bearer token passes
/// through unauthenticated (some routes are anonymous); a request carrying
/// one is rejected when the token is empty, structurally undecodable, or
/// blacklisted by a logout. Signature and expiry checks belong to the
/// full-validation middleware on protected scopes.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::session::SessionEngine;

pub struct RevocationGate {
    engine: Arc<SessionEngine>,
}

impl RevocationGate {
    pub fn new(engine: Arc<SessionEngine>) -> Self {
        Self { engine }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RevocationGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RevocationGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RevocationGateService {
            service: Rc::new(service),
            engine: self.engine.clone(),
        }))
    }
}

pub struct RevocationGateService<S> {
    service: Rc<S>,
    engine: Arc<SessionEngine>,
}

/// The bearer token, if the request claims to carry one. A non-Bearer
/// Authorization scheme counts as no bearer token at all.
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;

    if let Some(rest) = header.strip_prefix("Bearer ") {
        Some(rest.trim().to_string())
    } else if header.trim() == "Bearer" {
        // The caller meant to send one and sent nothing.
        Some(String::new())
    } else {
        None
    }
}

impl<S, B> Service<ServiceRequest> for RevocationGateService<S>
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
        let token = bearer_token(&req);
        let service = self.service.clone();
        let engine = self.engine.clone();

        Box::pin(async move {
            if let Some(token) = token {
                engine.authorize(&token).await.map_err(Error::from)?;
            }
            service.call(req).await
        })
    }
}
