use std::time::Duration;

use super::{ChatRequest, ChatResponse, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Serialize, Debug)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

fn build_request(request: &ChatRequest) -> ClaudeRequest {
    let messages: Vec<ClaudeMessage> = request
        .messages
        .iter()
        .map(|m| ClaudeMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        })
        .collect();

    ClaudeRequest {
        model: request.model.clone(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        messages,
        system: request.system.clone().filter(|s| !s.is_empty()),
    }
}

pub async fn chat(config: &ClaudeConfig, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
    let client = Client::builder().timeout(config.timeout).build()?;
    let body = build_request(request);

    let resp = client
        .post(format!("{}/v1/messages", config.base_url))
        .header("Content-Type", "application/json")
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let data: ClaudeResponse = resp
        .json()
        .await
        .map_err(|e| LlmError::Parse(e.to_string()))?;
    let content = data
        .content
        .first()
        .map(|c| c.text.clone())
        .ok_or_else(|| LlmError::Parse("response has no content blocks".to_string()))?;

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

    fn request(system: Option<&str>) -> ChatRequest {
        ChatRequest {
            system: system.map(str::to_string),
            messages: vec![ChatMessage::user("hola"), ChatMessage::assistant("buenas")],
            model: "claude-test".into(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let body = serde_json::to_value(build_request(&request(Some("sos un coach")))).unwrap();
        assert_eq!(body["system"], "sos un coach");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn test_empty_system_prompt_omitted() {
        let body = serde_json::to_value(build_request(&request(Some("")))).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_response_usage_passthrough() {
        let data: ClaudeResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"hola"}],"usage":{"input_tokens":3,"output_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(data.content[0].text, "hola");
        assert_eq!(data.usage.unwrap()["output_tokens"], 5);
    }
}
