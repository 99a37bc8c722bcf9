use crate::models::{MatchedPair, UserRole};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors from the notification backend; logged, never propagated to callers
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Notification API returned error: {0}")]
    ApiError(String),

    #[error("Notification delivery is disabled")]
    Disabled,
}

/// Contacts of one applied pairing, queued for post-commit notification
///
/// Carries only what the notification service needs; neither party's message
/// includes the other's personal data.
#[derive(Debug, Clone)]
pub struct MatchNotification {
    pub newcomer_id: i64,
    pub newcomer_email: String,
    pub veteran_id: i64,
    pub veteran_email: String,
}

impl MatchNotification {
    pub fn from_pair(pair: &MatchedPair) -> Self {
        Self {
            newcomer_id: pair.newcomer.id,
            newcomer_email: pair.newcomer.email.clone(),
            veteran_id: pair.veteran.id,
            veteran_email: pair.veteran.email.clone(),
        }
    }
}

/// Per-party delivery result for one pairing
#[derive(Debug, Clone, Copy)]
pub struct NotifyResult {
    pub newcomer_sent: bool,
    pub veteran_sent: bool,
}

impl NotifyResult {
    pub fn success(&self) -> bool {
        self.newcomer_sent && self.veteran_sent
    }
}

/// Best-effort client for the platform notification service
///
/// Delivery runs after the reconciliation transaction has committed and is
/// fire-and-forget: a failed send is logged and dropped, never retried here
/// and never surfaced as a run failure.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl NotificationClient {
    /// Create a new notification client; an empty endpoint disables delivery
    pub fn new(endpoint: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            client,
        }
    }

    pub fn enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }

    /// Notify both parties of one pairing
    pub async fn notify_pair(&self, notification: &MatchNotification) -> NotifyResult {
        let newcomer_sent = self
            .send_one(
                &notification.newcomer_email,
                UserRole::Newcomer,
                notification.newcomer_id,
            )
            .await;
        let veteran_sent = self
            .send_one(
                &notification.veteran_email,
                UserRole::Veteran,
                notification.veteran_id,
            )
            .await;

        NotifyResult {
            newcomer_sent,
            veteran_sent,
        }
    }

    /// Notify every applied pairing of a run, logging a delivery summary
    pub async fn notify_all(&self, notifications: &[MatchNotification]) {
        if notifications.is_empty() {
            return;
        }

        let mut delivered = 0;
        for notification in notifications {
            if self.notify_pair(notification).await.success() {
                delivered += 1;
            }
        }

        tracing::info!(
            "Match notifications: {}/{} pairs fully delivered",
            delivered,
            notifications.len()
        );
    }

    async fn send_one(&self, email: &str, role: UserRole, user_id: i64) -> bool {
        match self.deliver(email, role).await {
            Ok(()) => {
                tracing::debug!(
                    "Match notification sent to {} (id: {}, role: {})",
                    email,
                    user_id,
                    role.as_str()
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Match notification to {} (id: {}) failed: {}",
                    email,
                    user_id,
                    e
                );
                false
            }
        }
    }

    async fn deliver(&self, email: &str, role: UserRole) -> Result<(), NotifyError> {
        if !self.enabled() {
            return Err(NotifyError::Disabled);
        }

        let payload = json!({
            "email": email,
            "role": role.as_str(),
            "template": "match_created",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::ApiError(format!(
                "notification API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> MatchNotification {
        MatchNotification {
            newcomer_id: 1,
            newcomer_email: "newcomer@paduni.com".to_string(),
            veteran_id: 2,
            veteran_email: "veteran@paduni.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_notify_pair_sends_one_request_per_party() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let client = NotificationClient::new(server.url(), "key".to_string(), 5);
        let result = client.notify_pair(&notification()).await;

        assert!(result.success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_disabled_client_never_succeeds_or_panics() {
        let client = NotificationClient::new(String::new(), String::new(), 1);
        let result = client.notify_pair(&notification()).await;

        assert!(!result.newcomer_sent);
        assert!(!result.veteran_sent);
    }

    #[tokio::test]
    async fn test_partial_failure_reported_per_party() {
        let mut server = mockito::Server::new_async().await;
        // First request succeeds, second hits the error mock
        let _ok = server
            .mock("POST", "/")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let _fail = server
            .mock("POST", "/")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = NotificationClient::new(server.url(), "key".to_string(), 5);
        let result = client.notify_pair(&notification()).await;

        assert!(!result.success());
    }
}
