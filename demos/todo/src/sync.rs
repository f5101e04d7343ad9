//! Sync collaborator: pushes the item list to a remote server.
//!
//! The answer only affects logging, never state.

use crate::error::SyncError;
use crate::types::TodoEffect;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Sends effects to the remote side
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Deliver one effect
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the effect could not be delivered or was
    /// refused.
    async fn send(&self, effect: &TodoEffect) -> Result<(), SyncError>;
}

/// Accepts every effect without sending it anywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

#[async_trait]
impl SyncClient for NoopSync {
    async fn send(&self, effect: &TodoEffect) -> Result<(), SyncError> {
        tracing::trace!(effect = ?effect, "Sync disabled, accepting effect");
        Ok(())
    }
}

/// Reply body of the sync endpoint
///
/// `{ "success": true }` or `{ "success": false, "error": "..." }`. Servers
/// that answer with an empty body are judged by status code alone.
#[derive(Debug, Deserialize)]
struct ServerReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// POSTs each effect as JSON to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpSync {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSync {
    /// Creates a client for `endpoint`
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint effects are posted to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SyncClient for HttpSync {
    async fn send(&self, effect: &TodoEffect) -> Result<(), SyncError> {
        let body = serde_json::to_vec(effect)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ServerReply>(&text)
                .ok()
                .and_then(|reply| reply.error)
                .unwrap_or(text);
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str::<ServerReply>(&text) {
            Ok(ServerReply { success: false, error }) => Err(SyncError::Rejected {
                status: status.as_u16(),
                message: error.unwrap_or_else(|| "unspecified error".to_string()),
            }),
            _ => {
                tracing::debug!(endpoint = %self.endpoint, "Synced with server");
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TodoId, TodoItem};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn effect() -> TodoEffect {
        TodoEffect::Sync {
            items: vec![TodoItem::new(TodoId::new(1), "buy milk")],
        }
    }

    /// Answers a single HTTP request with `status` and `body`, returning the request body
    async fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/sync", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            let body_start = loop {
                let read = socket.read(&mut chunk).await.unwrap();
                assert!(read > 0, "client closed the connection early");
                request.extend_from_slice(&chunk[..read]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break end + 4;
                }
            };

            let head = String::from_utf8_lossy(&request[..body_start]).to_lowercase();
            let length: usize = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map_or(0, |value| value.trim().parse().unwrap());
            while request.len() < body_start + length {
                let read = socket.read(&mut chunk).await.unwrap();
                assert!(read > 0, "client closed the connection early");
                request.extend_from_slice(&chunk[..read]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&request[body_start..]).into_owned()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_noop_accepts_everything() {
        assert!(NoopSync.send(&effect()).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_posts_tagged_effect() {
        let (url, server) = one_shot_server("200 OK", r#"{"success":true}"#).await;
        let client = HttpSync::new(url, Duration::from_secs(5)).unwrap();

        client.send(&effect()).await.unwrap();

        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["action"], "sync");
        assert_eq!(sent["items"][0]["text"], "buy milk");
    }

    #[tokio::test]
    async fn test_http_reported_failure_is_rejection() {
        let (url, server) =
            one_shot_server("200 OK", r#"{"success":false,"error":"stale list"}"#).await;
        let client = HttpSync::new(url, Duration::from_secs(5)).unwrap();

        let result = client.send(&effect()).await;
        server.await.unwrap();

        match result {
            Err(SyncError::Rejected { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "stale list");
            },
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_server_error_is_transient() {
        let (url, server) = one_shot_server("503 Service Unavailable", "").await;
        let client = HttpSync::new(url, Duration::from_secs(5)).unwrap();

        let error = client.send(&effect()).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(error, SyncError::Rejected { status: 503, .. }));
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn test_http_unreachable_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/sync", listener.local_addr().unwrap());
        drop(listener);

        let client = HttpSync::new(url, Duration::from_secs(5)).unwrap();
        let error = client.send(&effect()).await.unwrap_err();

        assert!(matches!(error, SyncError::Transport(_)));
        assert!(error.is_transient());
    }
}
