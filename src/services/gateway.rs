use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::schemas::gateway::{Action, GatewayEnvelope, GatewayReply};

/// The request never produced a usable reply.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("gateway url is not configured")]
    NotConfigured,
    #[error("gateway request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("gateway returned HTTP {0}")]
    Status(u16),
    #[error("gateway reply is not a JSON object: {0}")]
    Decode(String),
}

/// Single request/response seam to the remote store.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn call(&self, action: Action, data: Value) -> Result<GatewayReply, TransportError>;
}

pub type SharedGateway = Arc<dyn Gateway>;

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    url: String,
}

impl HttpGateway {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(settings.gateway().timeout_seconds))
            .build()
            .context("Failed to build gateway HTTP client")?;

        Ok(Self { client, url: settings.gateway().url.clone() })
    }

    async fn send(&self, action: Action, data: &Value) -> Result<GatewayReply, TransportError> {
        if self.url.is_empty() {
            return Err(TransportError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&GatewayEnvelope { action, data })
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let raw_body = response.text().await.map_err(TransportError::Request)?;
        serde_json::from_str::<GatewayReply>(&raw_body).map_err(|err| {
            let preview: String = raw_body.chars().take(200).collect();
            TransportError::Decode(format!("{err}: {preview}"))
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(&self, action: Action, data: Value) -> Result<GatewayReply, TransportError> {
        let request_id = Uuid::new_v4();
        let timer = Instant::now();

        let result = self.send(action, &data).await;
        let elapsed_ms = timer.elapsed().as_millis() as u64;

        match &result {
            Ok(reply) => tracing::info!(
                %request_id,
                action = action.as_str(),
                success = reply.success,
                elapsed_ms,
                "Gateway call completed"
            ),
            Err(err) => tracing::warn!(
                %request_id,
                action = action.as_str(),
                error = %err,
                elapsed_ms,
                "Gateway call failed"
            ),
        }

        result
    }
}
