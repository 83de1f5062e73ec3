//! Chat provider capability and its HTTP clients.
//!
//! The agent only depends on [`ChatProvider`]; [`ollama`] and [`openai`]
//! are the two concrete transports.

pub mod ollama;
pub mod openai;

use crate::models::{ConversationMessage, TokenUsage, ToolCallRequest};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure of a chat call. Always fatal for the run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to {provider} at {url}. Is {provider} running?")]
    Connect { provider: &'static str, url: String },

    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("Failed to send request: {0}")]
    Request(String),
}

/// One model reply: text, structured tool calls (native protocol only)
/// and the tokens it cost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Display name of the backend, e.g. "Ollama".
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Whether the backend returns structured tool calls.
    fn supports_native_tools(&self) -> bool;

    /// Chat with tool schemas attached.
    async fn chat_with_tools(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, ProviderError>;

    /// Plain chat without schemas.
    async fn chat(&self, messages: &[ConversationMessage]) -> Result<ChatResponse, ProviderError>;
}

/// Which HTTP API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    /// Any OpenAI-compatible chat completions endpoint.
    Openai,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::Openai => write!(f, "openai"),
        }
    }
}

/// Connection settings shared by both clients.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// Build the configured provider.
pub fn build_provider(
    kind: ProviderKind,
    settings: ProviderSettings,
) -> Result<Arc<dyn ChatProvider>, ProviderError> {
    let client = http_client(settings.timeout_seconds)?;
    Ok(match kind {
        ProviderKind::Ollama => Arc::new(ollama::OllamaProvider::new(settings, client)),
        ProviderKind::Openai => Arc::new(openai::OpenAiProvider::new(settings, client)),
    })
}

fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| ProviderError::Request(format!("Failed to create HTTP client: {}", e)))
}

/// Classify a transport error.
fn send_error(
    e: reqwest::Error,
    provider: &'static str,
    settings: &ProviderSettings,
) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(settings.timeout_seconds)
    } else if e.is_connect() {
        ProviderError::Connect {
            provider,
            url: settings.url.clone(),
        }
    } else {
        ProviderError::Request(e.to_string())
    }
}

/// Send a JSON POST and decode the JSON reply, mapping every failure.
async fn post_json<B: Serialize + ?Sized, R: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    body: &B,
    provider: &'static str,
    settings: &ProviderSettings,
) -> Result<R, ProviderError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| send_error(e, provider, settings))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status,
            body,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| send_error(e, provider, settings))?;
    serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
        provider,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wording() {
        let e = ProviderError::Connect {
            provider: "Ollama",
            url: "http://localhost:11434".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Cannot connect to Ollama at http://localhost:11434. Is Ollama running?"
        );
        assert_eq!(
            ProviderError::Timeout(30).to_string(),
            "Request timed out after 30s"
        );
    }

    #[test]
    fn test_provider_kind_serde() {
        let kind: ProviderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, ProviderKind::Openai);
        assert_eq!(ProviderKind::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_build_provider() {
        let settings = ProviderSettings {
            url: "http://localhost:11434".to_string(),
            model: "qwen2.5-coder".to_string(),
            api_key: None,
            temperature: 0.1,
            timeout_seconds: 5,
        };
        let provider = build_provider(ProviderKind::Ollama, settings).unwrap();
        assert_eq!(provider.name(), "Ollama");
        assert_eq!(provider.model(), "qwen2.5-coder");
    }
}
