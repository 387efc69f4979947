//! Completion gateway: turns a conversation history into assistant text.
//!
//! The chat controller only sees [`CompletionGateway`]. Two implementations
//! ship here: [`AgentGateway`] talks to the upstream model directly (and
//! degrades to canned replies when no provider is configured), while
//! [`HttpGateway`] calls a remote completion endpoint speaking the
//! [`wire`] format.

pub mod agent;
pub mod http;
pub mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::CatalogError;
use crate::chat::message::ChatMessage;

pub use agent::{AgentGateway, CompletionOptions};
pub use http::HttpGateway;

/// Result of one completion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    /// Canned reply produced without an upstream provider.
    #[serde(default)]
    pub mock: bool,
    /// The content is a failure notice, not an answer.
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

impl Completion {
    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn mock(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mock: true,
            ..Self::default()
        }
    }

    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: true,
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: Option<serde_json::Value>) -> Self {
        self.usage = usage;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
    #[error("Conversation has no user message")]
    EmptyHistory,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl Serialize for GatewayError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        history: &[ChatMessage],
        agent_id: &str,
    ) -> Result<Completion, GatewayError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Gateway returning scripted results and recording what it was sent.
    #[derive(Default)]
    pub struct ScriptedGateway {
        responses: Mutex<VecDeque<Result<Completion, GatewayError>>>,
        pub calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    }

    impl ScriptedGateway {
        pub fn new(responses: Vec<Result<Completion, GatewayError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn last_history(&self) -> Vec<ChatMessage> {
            self.calls
                .lock()
                .unwrap()
                .last()
                .map(|(history, _)| history.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            history: &[ChatMessage],
            agent_id: &str,
        ) -> Result<Completion, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((history.to_vec(), agent_id.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Completion::reply("ok")))
        }
    }
}
