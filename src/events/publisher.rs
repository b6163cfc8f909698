//! Event publishing port and its HTTP transport.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink rejected event on channel '{channel}' with status {status}")]
    Rejected { channel: String, status: StatusCode },
}

/// Deliver an encoded event to a named channel.
///
/// Callers treat failures as non-fatal.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Publishes by POSTing the payload to `{base}/{channel}` as JSON.
pub struct HttpEventPublisher {
    client: Client,
    base_url: String,
}

impl HttpEventPublisher {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("Invalid event sink URL '{}'", base_url))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn channel_url(&self, channel: &str) -> String {
        format!("{}/{}", self.base_url, channel)
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), PublishError> {
        let resp = self
            .client
            .post(self.channel_url(channel))
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                channel: channel.to_string(),
                status,
            });
        }
        tracing::debug!(%channel, bytes = payload.len(), "event published");
        Ok(())
    }
}
