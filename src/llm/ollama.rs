//! Ollama `/api/chat` client.

use super::{post_json, ChatProvider, ChatResponse, ProviderError, ProviderSettings};
use crate::models::{ConversationMessage, TokenUsage, ToolCallRequest};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

const PROVIDER: &str = "Ollama";

/// Message in the chat history, as Ollama expects it.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallMessage {
    function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDefinition],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallMessage>>,
}

pub struct OllamaProvider {
    settings: ProviderSettings,
    http_client: reqwest::Client,
    /// Ollama does not return call ids, so they are numbered here.
    next_call_id: AtomicUsize,
}

impl OllamaProvider {
    pub fn new(settings: ProviderSettings, http_client: reqwest::Client) -> Self {
        Self {
            settings,
            http_client,
            next_call_id: AtomicUsize::new(1),
        }
    }

    async fn send(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.settings.url.trim_end_matches('/'));
        let request = OllamaChatRequest {
            model: &self.settings.model,
            messages: messages.iter().map(to_wire).collect(),
            tools,
            stream: false,
            options: OllamaOptions {
                temperature: self.settings.temperature,
            },
        };
        debug!(
            "Sending {} messages to Ollama ({} tools)",
            request.messages.len(),
            tools.len()
        );

        let response: OllamaChatResponse = post_json(
            self.http_client.post(&url),
            &request,
            PROVIDER,
            &self.settings,
        )
        .await?;
        Ok(self.from_wire(response))
    }

    fn from_wire(&self, response: OllamaChatResponse) -> ChatResponse {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
                let arguments = match call.function.arguments {
                    Value::String(raw) => raw,
                    Value::Null => "{}".to_string(),
                    other => other.to_string(),
                };
                ToolCallRequest::new(Some(format!("call_{}", id)), call.function.name, arguments)
            })
            .collect();

        ChatResponse {
            content: response.message.content,
            tool_calls,
            usage: TokenUsage {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            },
        }
    }
}

fn to_wire(message: &ConversationMessage) -> ChatMessage {
    let plain = |role, content: &str| ChatMessage {
        role,
        content: content.to_string(),
        tool_calls: None,
        tool_name: None,
    };
    match message {
        ConversationMessage::System { content } => plain("system", content),
        ConversationMessage::User { content } => plain("user", content),
        ConversationMessage::Assistant {
            content,
            tool_calls,
        } => ChatMessage {
            tool_calls: (!tool_calls.is_empty()).then(|| {
                tool_calls
                    .iter()
                    .map(|call| ToolCallMessage {
                        function: ToolCallFunction {
                            name: call.function_name.clone(),
                            arguments: serde_json::from_str(&call.arguments_json)
                                .unwrap_or_else(|_| Value::Object(Default::default())),
                        },
                    })
                    .collect()
            }),
            ..plain("assistant", content)
        },
        ConversationMessage::ToolResult { name, content, .. } => ChatMessage {
            tool_name: Some(name.clone()),
            ..plain("tool", content)
        },
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    fn supports_native_tools(&self) -> bool {
        true
    }

    async fn chat_with_tools(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, ProviderError> {
        self.send(messages, tools).await
    }

    async fn chat(&self, messages: &[ConversationMessage]) -> Result<ChatResponse, ProviderError> {
        self.send(messages, &[]).await
    }
}
