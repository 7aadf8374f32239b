//! Webhook notifier
//!
//! Posts `{"fqdn": ..., "ip": ..., "send_to": ...}` to the configured URL
//! after every successful record update.

use async_trait::async_trait;
use ddns_core::config::NotifyConfig;
use ddns_core::traits::Notifier;
use ddns_core::{Error, Result};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct Payload<'a> {
    fqdn: &'a str,
    ip: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    send_to: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    send_to: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, send_to: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            send_to,
            client,
        })
    }

    /// Build a notifier if notifications are enabled
    pub fn from_config(config: &NotifyConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let url = config
            .webhook_url
            .clone()
            .ok_or_else(|| Error::config("Notification webhook URL is missing"))?;

        Self::new(url, config.send_to.clone()).map(Some)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, fqdn: &str, ip: &str) -> Result<()> {
        let payload = Payload {
            fqdn,
            ip,
            send_to: self.send_to.as_deref(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notify(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::notify(format!(
                "Webhook returned {}",
                response.status()
            )));
        }

        tracing::debug!(fqdn = %fqdn, ip = %ip, "Notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_update_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({
                "fqdn": "home.example.com",
                "ip": "1.2.3.5",
                "send_to": "ops@example.com"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            format!("{}/hook", server.uri()),
            Some("ops@example.com".to_string()),
        )
        .unwrap();

        notifier.notify("home.example.com", "1.2.3.5").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_notify_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri(), None).unwrap();
        let result = notifier.notify("home.example.com", "1.2.3.5").await;

        assert!(matches!(result, Err(Error::Notify(_))));
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        let config = NotifyConfig {
            enabled: false,
            webhook_url: Some("https://hooks.example.com".to_string()),
            send_to: None,
        };

        assert!(WebhookNotifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_enabled_config_builds_notifier() {
        let config = NotifyConfig {
            enabled: true,
            webhook_url: Some("https://hooks.example.com".to_string()),
            send_to: Some("ops@example.com".to_string()),
        };

        let notifier = WebhookNotifier::from_config(&config).unwrap().unwrap();
        assert_eq!(notifier.url, "https://hooks.example.com");
    }
}
