use std::time::Duration;

use async_trait::async_trait;

use crate::error::SinkError;

pub const IFTTT_WEBHOOK_URL: &str = "https://maker.ifttt.com";

#[async_trait]
pub trait ActuatorSink: Send + Sync {
    /// Fires `event_name` once. Retrying is the transport's business.
    async fn trigger(&self, key: &str, event_name: &str) -> Result<(), SinkError>;
}

/// IFTTT Maker webhooks.
pub struct IftttWebhook {
    client: reqwest::Client,
    base_url: String,
}

impl IftttWebhook {
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, IFTTT_WEBHOOK_URL.to_string()))
    }

    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn event_url(&self, key: &str, event_name: &str) -> String {
        format!("{}/trigger/{event_name}/with/key/{key}", self.base_url)
    }
}

#[async_trait]
impl ActuatorSink for IftttWebhook {
    async fn trigger(&self, key: &str, event_name: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.event_url(key, event_name))
            .send()
            .await
            .map_err(|err| SinkError::Request(err.without_url()))?;
        if !response.status().is_success() {
            return Err(SinkError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
