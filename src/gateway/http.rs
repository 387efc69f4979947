use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::wire::{CompletionRequest, CompletionResponse};
use super::{Completion, CompletionGateway, GatewayError};
use crate::chat::message::ChatMessage;

/// Client of a remote completion endpoint.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(endpoint, client))
    }

    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(
        &self,
        history: &[ChatMessage],
        agent_id: &str,
    ) -> Result<Completion, GatewayError> {
        let body = CompletionRequest {
            messages: history.to_vec(),
            agent_id: agent_id.to_string(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(status = status.as_u16(), endpoint = %self.endpoint, "completion endpoint rejected request");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let data: CompletionResponse = resp.json().await?;
        Ok(data.into_completion())
    }
}
