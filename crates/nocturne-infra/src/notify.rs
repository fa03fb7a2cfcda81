//! HTTP notification sink.
//!
//! Posts `{"input": <message>}` to the notification API with a bearer
//! token. One attempt per message; any 2xx counts as delivered.

use std::time::Duration;

use nocturne_core::notify::NotificationSink;
use nocturne_types::error::NotifyError;
use secrecy::{ExposeSecret, SecretString};

/// Notification API client.
pub struct HttpNotificationSink {
    client: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
}

impl HttpNotificationSink {
    /// Create a sink. A `None` token makes every send a `MissingCredential`.
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }
}

impl NotificationSink for HttpNotificationSink {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let Some(token) = &self.token else {
            return Err(NotifyError::MissingCredential);
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.expose_secret())
            .json(&serde_json::json!({ "input": message }))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer, token: Option<&str>) -> HttpNotificationSink {
        HttpNotificationSink::new(
            format!("{}/zo/ask", server.uri()),
            token.map(|t| SecretString::from(t.to_string())),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_input_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zo/ask"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(serde_json::json!({ "input": "hello" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        sink(&server, Some("tok-123")).send("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_is_rejected_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = sink(&server, Some("tok")).send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 503 }));
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = sink(&server, None).send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::MissingCredential));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let sink = HttpNotificationSink::new(
            "http://127.0.0.1:1/zo/ask",
            Some(SecretString::from("tok".to_string())),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = sink.send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
