/// Generic notification sender.
///
/// Fire-and-forget from the engine's perspective: delivery failures are
/// logged here and never surfaced as authentication errors. The transport
/// is a collaborator; `HttpNotifier` posts to a relay endpoint and
/// `LogNotifier` stands in when none is configured.

use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str);
}

#[derive(Serialize)]
struct SendMessageRequest {
    to: String,
    subject: String,
    body: String,
}

/// Posts messages to an HTTP notification relay.
#[derive(Clone)]
pub struct HttpNotifier {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(base_url: String, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) {
        let url = format!("{}/notifications", self.base_url);
        let request = SendMessageRequest {
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        let outcome = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match outcome {
            Ok(_) => tracing::debug!(recipient = recipient, "Notification delivered"),
            Err(e) => tracing::error!(recipient = recipient, error = %e, "Failed to send notification"),
        }
    }
}

/// Log-only delivery for deployments without a relay.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) {
        tracing::info!(
            recipient = recipient,
            subject = subject,
            "Notification (log-only delivery)"
        );
    }
}
