//! Turn protocols: how one model turn asks for tools and how results go back.
//!
//! The loop in [`super::agent_loop`] only talks to [`TurnProtocol`]; which
//! implementation is active is decided once per run.

use crate::agent::{prompts, react};
use crate::llm::{ChatProvider, ProviderError};
use crate::models::{ConversationMessage, TokenUsage, ToolCallRequest};
use crate::tools::{ToolDefinition, ToolRegistry};
use async_trait::async_trait;

/// Outcome of one provider call, already interpreted by the protocol.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Message to append to the history verbatim.
    pub assistant: ConversationMessage,
    /// Requested tool calls, in the order given by the model.
    pub calls: Vec<ToolCallRequest>,
    /// Answer text to use when `calls` is empty.
    pub answer: String,
    pub usage: TokenUsage,
}

/// A tool call together with its textual output.
#[derive(Debug, Clone)]
pub struct ExecutedCall {
    pub request: ToolCallRequest,
    pub output: String,
}

#[async_trait]
pub trait TurnProtocol: Send + Sync {
    /// Short protocol label for logs and events.
    fn name(&self) -> &'static str;

    fn system_prompt(&self, registry: &ToolRegistry) -> String;

    /// Ask the provider for the next turn.
    async fn request(
        &self,
        provider: &dyn ChatProvider,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<Turn, ProviderError>;

    /// Messages carrying one turn's tool results back to the model.
    fn result_messages(&self, executed: Vec<ExecutedCall>) -> Vec<ConversationMessage>;
}

/// Pick the protocol for a run.
pub fn select_protocol(native: bool) -> Box<dyn TurnProtocol> {
    if native {
        Box::new(NativeProtocol)
    } else {
        Box::new(ReactProtocol)
    }
}

/// Structured function calling; one tool message per call id.
pub struct NativeProtocol;

#[async_trait]
impl TurnProtocol for NativeProtocol {
    fn name(&self) -> &'static str {
        "native"
    }

    fn system_prompt(&self, _registry: &ToolRegistry) -> String {
        prompts::native_system_prompt()
    }

    async fn request(
        &self,
        provider: &dyn ChatProvider,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<Turn, ProviderError> {
        let response = provider.chat_with_tools(messages, tools).await?;
        Ok(Turn {
            assistant: ConversationMessage::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ),
            calls: response.tool_calls,
            answer: response.content.trim().to_string(),
            usage: response.usage,
        })
    }

    fn result_messages(&self, executed: Vec<ExecutedCall>) -> Vec<ConversationMessage> {
        executed
            .into_iter()
            .map(|call| ConversationMessage::ToolResult {
                call_id: call.request.call_id,
                name: call.request.function_name,
                content: call.output,
            })
            .collect()
    }
}

/// Tool calls embedded in free text; all results in one user message.
pub struct ReactProtocol;

#[async_trait]
impl TurnProtocol for ReactProtocol {
    fn name(&self) -> &'static str {
        "react"
    }

    fn system_prompt(&self, registry: &ToolRegistry) -> String {
        prompts::react_system_prompt(registry)
    }

    async fn request(
        &self,
        provider: &dyn ChatProvider,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<Turn, ProviderError> {
        let response = provider.chat(messages).await?;
        let calls = react::parse_tool_calls(&response.content);
        let stripped = react::strip_tool_calls(&response.content);
        let answer = if stripped.is_empty() {
            response.content.trim().to_string()
        } else {
            stripped
        };
        Ok(Turn {
            assistant: ConversationMessage::assistant(response.content, Vec::new()),
            calls,
            answer,
            usage: response.usage,
        })
    }

    fn result_messages(&self, executed: Vec<ExecutedCall>) -> Vec<ConversationMessage> {
        if executed.is_empty() {
            return Vec::new();
        }
        let results: Vec<(String, String)> = executed
            .into_iter()
            .map(|call| (call.request.function_name, call.output))
            .collect();
        vec![ConversationMessage::user(react::format_tool_results(&results))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executed(id: Option<&str>, name: &str, output: &str) -> ExecutedCall {
        ExecutedCall {
            request: ToolCallRequest::new(id.map(str::to_string), name, "{}"),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_native_results_bound_to_call_ids() {
        let messages = NativeProtocol.result_messages(vec![
            executed(Some("call_1"), "grep", "a"),
            executed(Some("call_2"), "glob", "b"),
        ]);
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1],
            ConversationMessage::ToolResult {
                call_id: Some("call_2".to_string()),
                name: "glob".to_string(),
                content: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_react_results_in_one_user_message() {
        let messages = ReactProtocol.result_messages(vec![
            executed(None, "grep", "a"),
            executed(None, "glob", "b"),
        ]);
        assert_eq!(messages.len(), 1);
        let ConversationMessage::User { content } = &messages[0] else {
            panic!("expected a user message");
        };
        assert!(content.contains("<tool_result name=\"grep\">\na\n</tool_result>"));
        assert!(content.contains("<tool_result name=\"glob\">\nb\n</tool_result>"));
    }

    #[test]
    fn test_select_protocol() {
        assert_eq!(select_protocol(true).name(), "native");
        assert_eq!(select_protocol(false).name(), "react");
    }
}
