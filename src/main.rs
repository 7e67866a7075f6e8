use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::BcryptHasher;
use authgate::configuration::get_configuration;
use authgate::notifier::{HttpNotifier, LogNotifier, Notifier};
use authgate::session::SessionEngine;
use authgate::startup::run;
use authgate::store::{InMemoryBlacklist, InMemoryCredentialStore};
use authgate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting authgate");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded and validated");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let notifier: Arc<dyn Notifier> = match &configuration.notifier.base_url {
        Some(base_url) => {
            tracing::info!(base_url = %base_url, "Using HTTP notification relay");
            Arc::new(HttpNotifier::new(base_url.clone(), reqwest::Client::new()))
        }
        None => {
            tracing::info!("No notification relay configured; using log-only delivery");
            Arc::new(LogNotifier)
        }
    };

    // Single-process store wiring; a deployment against an external
    // credential backend swaps these two Arcs and nothing else.
    let engine = Arc::new(SessionEngine::new(
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(InMemoryBlacklist::new()),
        Arc::new(BcryptHasher),
        notifier,
        configuration.jwt.clone(),
    ));

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    run(listener, engine)?.await
}
