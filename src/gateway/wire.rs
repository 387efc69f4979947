//! JSON shapes of the completion endpoint.
//!
//! Request: `{ "messages": [{ "role", "content" }], "agentId" }`.
//! Success: `{ "message", "mock"?, "usage"? }`. Failure: `{ "error": true,
//! "message" }`, optionally with a non-2xx status.

use serde::{Deserialize, Serialize};

use super::{Completion, CompletionGateway, GatewayError};
use crate::chat::message::ChatMessage;

/// Message used when a failure payload carries no text of its own.
pub const DEFAULT_SERVER_ERROR: &str = "Error en la respuesta del servidor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub agent_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

impl CompletionResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn into_completion(self) -> Completion {
        if self.error {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SERVER_ERROR.to_string());
            return Completion::failed(message);
        }
        Completion {
            content: self.message.unwrap_or_default(),
            mock: self.mock,
            error: false,
            usage: self.usage,
        }
    }
}

impl From<Completion> for CompletionResponse {
    fn from(completion: Completion) -> Self {
        if completion.error {
            return Self::failure(completion.content);
        }
        Self {
            error: false,
            message: Some(completion.content),
            mock: completion.mock,
            usage: completion.usage,
        }
    }
}

/// Serve one completion request, returning the HTTP status and JSON body.
///
/// Gateway-level failures that still produced text (the upstream apology) are
/// answered with 200 and `error: true` so the client shows that text.
pub async fn handle_completion(
    gateway: &dyn CompletionGateway,
    request: CompletionRequest,
) -> (u16, CompletionResponse) {
    if request.messages.is_empty() {
        return (400, CompletionResponse::failure("messages must not be empty"));
    }
    match gateway.complete(&request.messages, &request.agent_id).await {
        Ok(completion) => (200, completion.into()),
        Err(e @ GatewayError::UnknownAgent(_)) => (404, CompletionResponse::failure(e.to_string())),
        Err(e @ GatewayError::EmptyHistory) => (400, CompletionResponse::failure(e.to_string())),
        Err(e) => {
            tracing::error!(agent_id = %request.agent_id, error = %e, "completion request failed");
            (500, CompletionResponse::failure(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::BuiltinCatalog;
    use crate::gateway::{AgentGateway, CompletionOptions};
    use std::sync::Arc;

    #[test]
    fn test_request_uses_camel_case_agent_id() {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user("hola")],
            agent_id: "coach-ventas".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [{"role": "user", "content": "hola"}],
                "agentId": "coach-ventas"
            })
        );
    }

    #[test]
    fn test_success_payload_maps_to_completion() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{"message":"hi","mock":true}"#).unwrap();
        let completion = response.into_completion();
        assert_eq!(completion, Completion::mock("hi"));
    }

    #[test]
    fn test_error_flag_maps_to_failed_completion() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{"error":true,"message":"sin cuota"}"#).unwrap();
        assert_eq!(response.into_completion(), Completion::failed("sin cuota"));

        let bare: CompletionResponse = serde_json::from_str(r#"{"error":true}"#).unwrap();
        assert_eq!(
            bare.into_completion(),
            Completion::failed(DEFAULT_SERVER_ERROR)
        );
    }

    #[test]
    fn test_success_body_omits_false_flags() {
        let body = serde_json::to_value(CompletionResponse::from(Completion::reply("ok"))).unwrap();
        assert_eq!(body, serde_json::json!({"message": "ok"}));
    }

    #[tokio::test]
    async fn test_handler_statuses() {
        let gateway = AgentGateway::new(
            Arc::new(BuiltinCatalog::new()),
            None,
            CompletionOptions::default(),
        );

        let (status, body) = handle_completion(
            &gateway,
            CompletionRequest {
                messages: vec![ChatMessage::user("hola")],
                agent_id: "marketing-digital".into(),
            },
        )
        .await;
        assert_eq!(status, 200);
        assert!(body.mock);
        assert!(!body.error);

        let (status, body) = handle_completion(
            &gateway,
            CompletionRequest {
                messages: vec![ChatMessage::user("hola")],
                agent_id: "nadie".into(),
            },
        )
        .await;
        assert_eq!(status, 404);
        assert!(body.error);

        let (status, _) = handle_completion(
            &gateway,
            CompletionRequest {
                messages: vec![],
                agent_id: "marketing-digital".into(),
            },
        )
        .await;
        assert_eq!(status, 400);
    }
}
