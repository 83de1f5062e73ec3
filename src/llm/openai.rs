//! OpenAI-compatible `/v1/chat/completions` client.

use super::{post_json, ChatProvider, ChatResponse, ProviderError, ProviderSettings};
use crate::models::{ConversationMessage, TokenUsage, ToolCallRequest};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "OpenAI";

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDefinition],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

pub struct OpenAiProvider {
    settings: ProviderSettings,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings, http_client: reqwest::Client) -> Self {
        Self {
            settings,
            http_client,
        }
    }

    async fn send(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, ProviderError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.settings.url.trim_end_matches('/')
        );
        let request = CompletionRequest {
            model: &self.settings.model,
            messages: messages.iter().map(to_wire).collect(),
            tools,
            temperature: self.settings.temperature,
        };
        debug!(
            "Sending {} messages to {} ({} tools)",
            request.messages.len(),
            url,
            tools.len()
        );

        let mut builder = self.http_client.post(&url);
        if let Some(key) = self.settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }
        let response: CompletionResponse =
            post_json(builder, &request, PROVIDER, &self.settings).await?;
        from_wire(response)
    }
}

fn to_wire(message: &ConversationMessage) -> WireMessage {
    let plain = |role, content: &str| WireMessage {
        role,
        content: Some(content.to_string()),
        tool_calls: None,
        tool_call_id: None,
    };
    match message {
        ConversationMessage::System { content } => plain("system", content),
        ConversationMessage::User { content } => plain("user", content),
        ConversationMessage::Assistant {
            content,
            tool_calls,
        } if !tool_calls.is_empty() => WireMessage {
            content: (!content.is_empty()).then(|| content.clone()),
            tool_calls: Some(
                tool_calls
                    .iter()
                    .enumerate()
                    .map(|(index, call)| WireToolCall {
                        id: call
                            .call_id
                            .clone()
                            .unwrap_or_else(|| format!("call_{}", index + 1)),
                        call_type: function_type(),
                        function: WireFunction {
                            name: call.function_name.clone(),
                            arguments: call.arguments_json.clone(),
                        },
                    })
                    .collect(),
            ),
            ..plain("assistant", content)
        },
        ConversationMessage::Assistant { content, .. } => plain("assistant", content),
        ConversationMessage::ToolResult {
            call_id, content, ..
        } => WireMessage {
            tool_call_id: Some(call_id.clone().unwrap_or_default()),
            ..plain("tool", content)
        },
    }
}

fn from_wire(response: CompletionResponse) -> Result<ChatResponse, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Decode {
            provider: PROVIDER,
            message: "response contained no choices".to_string(),
        })?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallRequest::new(Some(call.id), call.function.name, call.function.arguments))
        .collect();
    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        usage,
    })
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call_response() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "read_file", "arguments": "{\"path\":\"A.cs\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 200, "completion_tokens": 20, "total_tokens": 220}
        }"#;
        let response: CompletionResponse = serde_json::from_str(raw).unwrap();
        let chat = from_wire(response).unwrap();

        assert_eq!(chat.content, "");
        assert_eq!(
            chat.tool_calls,
            vec![ToolCallRequest::new(
                Some("call_abc".into()),
                "read_file",
                r#"{"path":"A.cs"}"#
            )]
        );
        assert_eq!(chat.usage.total(), 220);
    }

    #[test]
    fn test_empty_choices_is_decode_error() {
        let response: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            from_wire(response),
            Err(ProviderError::Decode { .. })
        ));
    }

    #[test]
    fn test_tool_result_carries_call_id() {
        let wire = to_wire(&ConversationMessage::ToolResult {
            call_id: Some("call_abc".into()),
            name: "read_file".into(),
            content: "...".into(),
        });
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_abc");

        let call = ToolCallRequest::new(Some("call_abc".into()), "grep", "{}");
        let json = serde_json::to_value(to_wire(&ConversationMessage::assistant("", vec![call]))).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["tool_calls"][0]["type"], "function");
    }
}
