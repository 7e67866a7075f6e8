use actix_web::{web, App, HttpServer};
use actix_web::dev::Server;
use std::net::TcpListener;
use std::sync::Arc;

use crate::middleware::{JwtAuth, RequestLogger, RevocationGate};
use crate::routes::{
    health_check, login, logout, refresh, request_password_reset, reset_password, session_info,
};
use crate::session::SessionEngine;

pub fn run(listener: TcpListener, engine: Arc<SessionEngine>) -> Result<Server, std::io::Error> {
    let jwt_config = engine.jwt_settings().clone();
    let engine_data = web::Data::from(engine.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Gate first, logging outermost
            .wrap(RevocationGate::new(engine.clone()))
            .wrap(RequestLogger)

            // Shared state
            .app_data(engine_data.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            .route(
                "/auth/password-reset/request",
                web::post().to(request_password_reset),
            )
            .route(
                "/auth/password-reset/complete",
                web::post().to(reset_password),
            )

            // Protected routes (require a fully valid JWT)
            .service(
                web::scope("/api")
                    .wrap(JwtAuth::new(jwt_config.clone()))
                    .route("/session", web::get().to(session_info)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
