// Webhook notifier
//
// Wraps each message in a `{"content": ...}` envelope and POSTs it to the
// configured endpoint. Delivery is retried a fixed number of times with no
// delay between attempts.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{Result, WatchError};

/// Total send attempts per `deliver` call
pub const DELIVERY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub content: String,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("endpoint responded with {0}")]
    Status(StatusCode),
}

/// Outbound transport for webhook payloads
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn send(&self, url: &str, payload: &WebhookPayload) -> std::result::Result<(), SendError>;
}

/// reqwest backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn send(&self, url: &str, payload: &WebhookPayload) -> std::result::Result<(), SendError> {
        let response = self.client.post(url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status(status));
        }
        Ok(())
    }
}

pub struct Notifier {
    transport: Box<dyn WebhookTransport>,
    endpoint: String,
}

impl Notifier {
    pub fn new(transport: Box<dyn WebhookTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Deliver one message, trying up to `DELIVERY_ATTEMPTS` times
    pub async fn deliver(&self, message: &str) -> Result<()> {
        let payload = WebhookPayload {
            content: message.to_string(),
        };

        let mut attempt = 1;
        loop {
            match self.transport.send(&self.endpoint, &payload).await {
                Ok(()) => {
                    debug!(msg = message, attempt, "notification delivered");
                    return Ok(());
                }
                Err(source) if attempt >= DELIVERY_ATTEMPTS => {
                    return Err(WatchError::Delivery {
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    warn!(msg = message, attempt, error = %e, "notification attempt failed");
                    attempt += 1;
                }
            }
        }
    }
}
