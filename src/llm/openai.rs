use std::time::Duration;

use super::{ChatRequest, ChatResponse, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Serialize, Debug)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

fn build_request(request: &ChatRequest) -> OpenAiRequest {
    // OpenAI-compatible APIs take the system prompt as the first message.
    let system = request
        .system
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| OpenAiMessage {
            role: "system".to_string(),
            content: s.clone(),
        });
    let messages: Vec<OpenAiMessage> = system
        .chain(request.messages.iter().map(|m| OpenAiMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }))
        .collect();

    OpenAiRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stream: false,
    }
}

pub async fn chat(config: &OpenAiConfig, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
    let client = Client::builder().timeout(config.timeout).build()?;
    let body = build_request(request);

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = req.send().await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let data: OpenAiResponse = resp
        .json()
        .await
        .map_err(|e| LlmError::Parse(e.to_string()))?;
    let content = data
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .ok_or_else(|| LlmError::Parse("response has no choices".to_string()))?;

    Ok(ChatResponse {
        content,
        model: request.model.clone(),
        usage: data.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::ChatMessage;

    #[test]
    fn test_system_prompt_prepended() {
        let request = ChatRequest {
            system: Some("sos un mentor".into()),
            messages: vec![ChatMessage::user("ayuda")],
            model: "gpt-test".into(),
            max_tokens: 100,
            temperature: 0.2,
        };
        let body = build_request(&request);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[0].content, "sos un mentor");
        assert_eq!(body.messages[1].role, "user");
        assert!(!body.stream);
    }

    #[test]
    fn test_no_system_prompt() {
        let request = ChatRequest {
            system: None,
            messages: vec![ChatMessage::user("ayuda")],
            model: "gpt-test".into(),
            max_tokens: 100,
            temperature: 0.2,
        };
        assert_eq!(build_request(&request).messages.len(), 1);
    }
}
