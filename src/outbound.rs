use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::message::OutboundMessage;

/// Posts text to the chat service on behalf of the bot.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send `text`. The returned status is informational; only transport
    /// failures are errors.
    async fn send(&self, text: &str) -> Result<StatusCode>;
}

pub struct GroupMeClient {
    client: reqwest::Client,
    bot_id: String,
    api_url: String,
}

impl GroupMeClient {
    pub fn new(bot_id: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_id: bot_id.into(),
            api_url: api_url.into(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.bot_id.clone(), config.api_url.clone())
    }
}

#[async_trait]
impl Outbound for GroupMeClient {
    async fn send(&self, text: &str) -> Result<StatusCode> {
        let msg = OutboundMessage {
            bot_id: self.bot_id.clone(),
            text: text.to_string(),
        };
        let payload = serde_json::to_vec(&msg).context("Failed to serialize outbound message")?;

        debug!("Posting message to {}", self.api_url);

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .with_context(|| format!("Failed to post message to {}", self.api_url))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Chat service answered {} for bot post", status);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Router};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    type Captured = Arc<Mutex<Vec<(String, String)>>>;

    async fn capture(State(seen): State<Captured>, headers: HeaderMap, body: String) -> StatusCode {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        seen.lock().await.push((content_type, body));
        StatusCode::ACCEPTED
    }

    async fn spawn_capture_server(with_route: bool) -> (String, Captured) {
        let seen: Captured = Arc::new(Mutex::new(Vec::new()));
        let mut app = Router::new();
        if with_route {
            app = app.route("/v3/bots/post", post(capture));
        }
        let app = app.with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v3/bots/post"), seen)
    }

    #[tokio::test]
    async fn test_send_posts_json_payload() {
        let (url, seen) = spawn_capture_server(true).await;
        let client = GroupMeClient::new("B1", url);

        let status = client.send("hi there").await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        let seen = seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "application/json");
        assert_eq!(seen[0].1, r#"{"bot_id":"B1","text":"hi there"}"#);
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let (url, _seen) = spawn_capture_server(false).await;
        let client = GroupMeClient::new("B1", url);

        let status = client.send("hello").await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GroupMeClient::new("B1", format!("http://{addr}/v3/bots/post"));
        assert!(client.send("hello").await.is_err());
    }
}
