use std::sync::Arc;

use async_trait::async_trait;

use super::{Completion, CompletionGateway, GatewayError};
use crate::agents::AgentCatalog;
use crate::chat::message::{ChatMessage, Role};
use crate::llm::{ChatRequest, Provider};

/// Filler replies served when no upstream provider is configured.
pub const MOCK_RESPONSES: &[&str] = &[
    "Gracias por tu consulta. Estoy aquí para ayudarte con estrategias específicas y recomendaciones prácticas.",
    "Entiendo tu situación. Basándome en mi experiencia, te sugiero que empecemos analizando...",
    "Excelente pregunta. Para darte la mejor recomendación, necesito entender mejor tu contexto específico.",
    "Esa es una consulta muy común y importante. Te puedo ayudar con un enfoque paso a paso.",
];

/// Reply sent back when the upstream call fails.
pub const APOLOGY: &str =
    "Disculpá, estoy teniendo problemas técnicos en este momento. ¿Podés intentar reformular tu consulta?";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Model id; `None` uses the provider's default.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

/// Server-side gateway: resolves the agent's system prompt and calls the
/// configured provider, or serves canned replies when there is none.
pub struct AgentGateway {
    catalog: Arc<dyn AgentCatalog>,
    provider: Option<Provider>,
    options: CompletionOptions,
}

impl AgentGateway {
    pub fn new(
        catalog: Arc<dyn AgentCatalog>,
        provider: Option<Provider>,
        options: CompletionOptions,
    ) -> Self {
        if provider.is_none() {
            tracing::warn!("no completion provider configured, serving mock responses");
        }
        Self {
            catalog,
            provider,
            options,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }
}

/// Pick a filler reply from the number of user turns so far.
pub fn mock_response(history: &[ChatMessage]) -> &'static str {
    let user_turns = history.iter().filter(|m| m.role == Role::User).count();
    MOCK_RESPONSES[user_turns.saturating_sub(1) % MOCK_RESPONSES.len()]
}

/// Drop assistant messages that precede the first user message.
fn upstream_transcript(history: &[ChatMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .skip_while(|m| m.role != Role::User)
        .cloned()
        .collect()
}

#[async_trait]
impl CompletionGateway for AgentGateway {
    async fn complete(
        &self,
        history: &[ChatMessage],
        agent_id: &str,
    ) -> Result<Completion, GatewayError> {
        let agent = self
            .catalog
            .get_agent(agent_id)?
            .ok_or_else(|| GatewayError::UnknownAgent(agent_id.to_string()))?;

        let Some(provider) = &self.provider else {
            return Ok(Completion::mock(mock_response(history)));
        };

        let messages = upstream_transcript(history);
        if messages.is_empty() {
            return Err(GatewayError::EmptyHistory);
        }

        let request = ChatRequest {
            system: Some(agent.system_prompt.clone()),
            messages,
            model: self
                .options
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        tracing::info!(
            agent_id,
            provider = provider.name(),
            model = %request.model,
            "calling completion provider"
        );
        match provider.chat(&request).await {
            Ok(response) => {
                tracing::info!(agent_id, "completion received");
                Ok(Completion::reply(response.content).with_usage(response.usage))
            }
            Err(e) => {
                tracing::error!(agent_id, error = %e, "completion provider failed");
                Ok(Completion::failed(APOLOGY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::BuiltinCatalog;
    use crate::llm::claude::ClaudeConfig;
    use crate::llm::DEFAULT_REQUEST_TIMEOUT;

    fn catalog() -> Arc<dyn AgentCatalog> {
        Arc::new(BuiltinCatalog::new())
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_serves_mock() {
        let gateway = AgentGateway::new(catalog(), None, CompletionOptions::default());
        assert!(!gateway.is_configured());

        let completion = gateway
            .complete(&[ChatMessage::user("hola")], "marketing-digital")
            .await
            .unwrap();
        assert!(completion.mock);
        assert!(!completion.error);
        assert_eq!(completion.content, MOCK_RESPONSES[0]);
    }

    #[test]
    fn test_mock_choice_is_deterministic() {
        let history = vec![
            ChatMessage::assistant("bienvenida"),
            ChatMessage::user("uno"),
            ChatMessage::assistant("r"),
            ChatMessage::user("dos"),
        ];
        assert_eq!(mock_response(&history), MOCK_RESPONSES[1]);
        assert_eq!(mock_response(&history), mock_response(&history));
        assert_eq!(mock_response(&[]), MOCK_RESPONSES[0]);
    }

    #[tokio::test]
    async fn test_unknown_agent_rejected() {
        let gateway = AgentGateway::new(catalog(), None, CompletionOptions::default());
        let err = gateway
            .complete(&[ChatMessage::user("hola")], "astrologo")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownAgent(id) if id == "astrologo"));
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_apology() {
        let provider = Provider::Claude(ClaudeConfig {
            api_key: "test-key".into(),
            base_url: "not a url".into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        });
        let gateway = AgentGateway::new(catalog(), Some(provider), CompletionOptions::default());

        let completion = gateway
            .complete(&[ChatMessage::user("hola")], "coach-ventas")
            .await
            .unwrap();
        assert!(completion.error);
        assert!(!completion.mock);
        assert_eq!(completion.content, APOLOGY);
    }

    #[tokio::test]
    async fn test_configured_gateway_needs_a_user_message() {
        let gateway = AgentGateway::new(
            catalog(),
            Some(Provider::claude("test-key".into())),
            CompletionOptions::default(),
        );
        let err = gateway
            .complete(&[ChatMessage::assistant("bienvenida")], "coach-ventas")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::EmptyHistory));
    }

    #[test]
    fn test_leading_assistant_messages_dropped() {
        let history = vec![
            ChatMessage::assistant("bienvenida"),
            ChatMessage::user("hola"),
            ChatMessage::assistant("buenas"),
        ];
        let transcript = upstream_transcript(&history);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0], ChatMessage::user("hola"));
    }
}
