//! Runtime configuration: environment variables first, then the `settings`
//! table for anything the environment leaves unset.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::db::{Database, DbError};
use crate::gateway::CompletionOptions;
use crate::llm::{Provider, DEFAULT_REQUEST_TIMEOUT};

/// Keys accepted in the `settings` table.
pub const SETTING_KEYS: &[&str] = &[
    "claude_api_key",
    "claude_base_url",
    "openai_api_key",
    "openai_base_url",
    "ollama_host",
    "provider",
    "model",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Unknown setting key: {0}")]
    UnknownSetting(String),
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl Serialize for ConfigError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    OpenAi,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub claude_api_key: Option<String>,
    pub claude_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub ollama_host: Option<String>,
    /// Explicit provider choice; `None` picks the first one with credentials.
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub database_path: Option<PathBuf>,
    /// Remote completion endpoint. When set the chat talks HTTP instead of
    /// calling the provider in-process.
    pub completion_url: Option<String>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let options = CompletionOptions::default();
        Self {
            claude_api_key: None,
            claude_base_url: None,
            openai_api_key: None,
            openai_base_url: None,
            ollama_host: None,
            provider: None,
            model: None,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            database_path: None,
            completion_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Config {
            claude_api_key: get("CLAUDE_API_KEY"),
            claude_base_url: get("CLAUDE_BASE_URL"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            ollama_host: get("OLLAMA_HOST"),
            provider: get("CHAT_PROVIDER").map(|v| v.parse()).transpose()?,
            model: get("CHAT_MODEL"),
            database_path: get("CHAT_DATABASE_PATH").map(PathBuf::from),
            completion_url: get("CHAT_COMPLETION_URL"),
            ..Config::default()
        };

        if let Some(raw) = get("CHAT_MAX_TOKENS") {
            config.max_tokens = parse_number("CHAT_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = get("CHAT_TEMPERATURE") {
            config.temperature = parse_number("CHAT_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = get("CHAT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("CHAT_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        Ok(config)
    }

    /// Fill every unset field from the `settings` table.
    pub fn overlay_settings(&mut self, db: &Database) -> Result<(), ConfigError> {
        fill(&mut self.claude_api_key, db, "claude_api_key")?;
        fill(&mut self.claude_base_url, db, "claude_base_url")?;
        fill(&mut self.openai_api_key, db, "openai_api_key")?;
        fill(&mut self.openai_base_url, db, "openai_base_url")?;
        fill(&mut self.ollama_host, db, "ollama_host")?;
        fill(&mut self.model, db, "model")?;
        if self.provider.is_none() {
            if let Some(value) = db.get_setting("provider")? {
                self.provider = Some(value.parse()?);
            }
        }
        Ok(())
    }

    /// The upstream provider to call, or `None` for demo mode.
    pub fn build_provider(&self) -> Option<Provider> {
        let kind = self.provider.or_else(|| {
            if self.claude_api_key.is_some() {
                Some(ProviderKind::Claude)
            } else if self.openai_api_key.is_some() {
                Some(ProviderKind::OpenAi)
            } else if self.ollama_host.is_some() {
                Some(ProviderKind::Ollama)
            } else {
                None
            }
        })?;

        let provider = match kind {
            ProviderKind::Claude => {
                let provider = Provider::claude(self.claude_api_key.clone()?);
                match &self.claude_base_url {
                    Some(url) => provider.with_base_url(url.as_str()),
                    None => provider,
                }
            }
            ProviderKind::OpenAi => {
                let provider = Provider::openai(self.openai_api_key.clone()?);
                match &self.openai_base_url {
                    Some(url) => provider.with_base_url(url.as_str()),
                    None => provider,
                }
            }
            ProviderKind::Ollama => Provider::ollama(
                self.ollama_host
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
            ),
        };
        Some(provider.with_timeout(self.request_timeout))
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn fill(slot: &mut Option<String>, db: &Database, key: &str) -> Result<(), ConfigError> {
    if slot.is_none() {
        *slot = db.get_setting(key)?.filter(|v| !v.trim().is_empty());
    }
    Ok(())
}

fn parse_number<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}

/// `abcd...wxyz` for values longer than 8 characters.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return value.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Stored settings with API keys masked for display.
pub fn masked_settings(db: &Database) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut map = BTreeMap::new();
    for key in SETTING_KEYS {
        if let Some(value) = db.get_setting(key)? {
            let shown = if key.ends_with("_api_key") {
                mask_secret(&value)
            } else {
                value
            };
            map.insert(key.to_string(), shown);
        }
    }
    Ok(map)
}

pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<(), ConfigError> {
    check_key(key)?;
    if key == "provider" {
        value.parse::<ProviderKind>()?;
    }
    db.set_setting(key, value.trim())?;
    tracing::info!(key, "setting updated");
    Ok(())
}

pub fn delete_setting(db: &Database, key: &str) -> Result<(), ConfigError> {
    check_key(key)?;
    db.delete_setting(key)?;
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if SETTING_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(ConfigError::UnknownSetting(key.to_string()))
    }
}
