//! Agent loop: ask the model, run the tools it requests, repeat.
//!
//! A run is strictly sequential. One provider call is in flight at a time
//! and the tools of one turn execute in the order the model listed them.
//! The loop ends when a turn requests no tools (that text is the answer)
//! or when the iteration cap is reached.

use crate::agent::events::{call_summary, result_summary, AgentEvent, NullSink, ProgressSink};
use crate::agent::prompts;
use crate::agent::turn::{select_protocol, ExecutedCall, TurnProtocol};
use crate::llm::{ChatProvider, ProviderError};
use crate::models::{AgentRunResult, ConversationMessage, ToolCallRecord, ToolCallRequest};
use crate::tools::{optional_str, parse_arguments, ToolExecutionContext, ToolRegistry};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Tools whose `path` argument names a file the run inspected.
const FILE_TOOLS: &[&str] = &["read_file", "file_outline", "related_files"];

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub max_iterations: usize,
    /// Characters of each tool result kept in the audit record.
    pub result_preview_chars: usize,
    /// Use structured function calling when the provider supports it.
    pub native_tools: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            result_preview_chars: 500,
            native_tools: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Run cancelled")]
    Cancelled,
}

/// Answers one question about the tree under a [`ToolExecutionContext`].
pub struct CodeQuestionAgent {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    context: ToolExecutionContext,
    config: AgentConfig,
    sink: Arc<dyn ProgressSink>,
}

impl CodeQuestionAgent {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        context: ToolExecutionContext,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            registry: Arc::new(ToolRegistry::with_builtin_tools()),
            context,
            config,
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Whether this run will use structured function calling.
    pub fn uses_native_tools(&self) -> bool {
        self.config.native_tools && self.provider.supports_native_tools()
    }

    /// Run the loop for `question` until an answer, the cap, a provider
    /// failure or cancellation.
    pub async fn run(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentRunResult, AgentError> {
        let protocol = select_protocol(self.uses_native_tools());
        info!(
            "Starting run with {} ({}, {} protocol, max {} iterations)",
            self.provider.name(),
            self.provider.model(),
            protocol.name(),
            self.config.max_iterations
        );
        self.sink.emit(&AgentEvent::RunStarted {
            question: question.to_string(),
            root: self.context.root().display().to_string(),
            provider: self.provider.name().to_string(),
            model: self.provider.model().to_string(),
            protocol: protocol.name().to_string(),
        });

        match self.iterate(protocol.as_ref(), question, cancel).await {
            Ok(result) => {
                info!(
                    iterations = result.iterations,
                    tool_calls = result.tool_calls.len(),
                    tokens = result.usage.total(),
                    "Run finished"
                );
                self.sink.emit(&AgentEvent::RunFinished {
                    answer: result.final_answer.clone(),
                    iterations: result.iterations,
                    tool_calls: result.tool_calls.len(),
                    total_tokens: result.usage.total(),
                    exhausted: result.exhausted,
                });
                Ok(result)
            }
            Err(e) => {
                warn!("Run failed: {}", e);
                self.sink.emit(&AgentEvent::RunError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn iterate(
        &self,
        protocol: &dyn TurnProtocol,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentRunResult, AgentError> {
        let definitions = self.registry.definitions();
        let mut messages = vec![
            ConversationMessage::system(protocol.system_prompt(&self.registry)),
            ConversationMessage::user(prompts::question_message(question)),
        ];
        let mut result = AgentRunResult::default();

        for iteration in 1..=self.config.max_iterations {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            result.iterations = iteration;
            debug!(iteration, messages = messages.len(), "Requesting model turn");

            let turn = tokio::select! {
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                turn = protocol.request(self.provider.as_ref(), &messages, &definitions) => turn?,
            };
            result.usage.add(turn.usage);
            messages.push(turn.assistant);

            if turn.calls.is_empty() {
                debug!(iteration, "Model returned a final answer");
                result.final_answer = turn.answer;
                return Ok(result);
            }

            let mut executed = Vec::with_capacity(turn.calls.len());
            for call in turn.calls {
                if cancel.is_cancelled() {
                    return Err(AgentError::Cancelled);
                }
                let output = self.run_tool(iteration, &call, &mut result, cancel).await?;
                executed.push(ExecutedCall {
                    request: call,
                    output,
                });
            }
            messages.extend(protocol.result_messages(executed));
        }

        info!(
            "Iteration cap of {} reached without a final answer",
            self.config.max_iterations
        );
        result.exhausted = true;
        result.final_answer = prompts::exhaustion_answer(self.config.max_iterations);
        Ok(result)
    }

    /// Execute one call on the blocking pool and record it.
    async fn run_tool(
        &self,
        iteration: usize,
        call: &ToolCallRequest,
        result: &mut AgentRunResult,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let summary = call_summary(&call.function_name, &call.arguments_json);
        self.sink.emit(&AgentEvent::ToolCallStarted {
            iteration,
            name: call.function_name.clone(),
            arguments: call.arguments_json.clone(),
            summary: summary.clone(),
        });

        let started = Instant::now();
        let registry = Arc::clone(&self.registry);
        let context = self.context.clone();
        let name = call.function_name.clone();
        let arguments = call.arguments_json.clone();
        let task = tokio::task::spawn_blocking(move || registry.execute(&name, &arguments, &context));

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            joined = task => joined.unwrap_or_else(|e| {
                warn!("Tool {} failed unexpectedly: {}", call.function_name, e);
                format!("Error: Tool '{}' failed unexpectedly: {}", call.function_name, e)
            }),
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            tool = %call.function_name,
            duration_ms,
            bytes = output.len(),
            "Tool executed"
        );

        if !output.starts_with("Error:") && FILE_TOOLS.contains(&call.function_name.as_str()) {
            if let Some(path) = self.touched_path(&call.arguments_json) {
                result.files_touched.insert(path);
            }
        }

        let (result_line, bullets) = result_summary(&output);
        self.sink.emit(&AgentEvent::ToolCallEnded {
            iteration,
            name: call.function_name.clone(),
            arguments: call.arguments_json.clone(),
            summary,
            result_summary: result_line,
            bullets,
            duration_ms,
        });
        result.tool_calls.push(ToolCallRecord {
            iteration,
            name: call.function_name.clone(),
            arguments: call.arguments_json.clone(),
            result_preview: preview(&output, self.config.result_preview_chars),
            duration_ms,
        });
        Ok(output)
    }

    /// Root-relative form of a call's `path` argument.
    fn touched_path(&self, arguments_json: &str) -> Option<String> {
        let args = parse_arguments(arguments_json).ok()?;
        let requested = optional_str(&args, "path")?;
        let resolved = self.context.resolve(requested).ok()?;
        let canonical = std::fs::canonicalize(&resolved).unwrap_or(resolved);
        Some(self.context.relative(&canonical))
    }
}

fn preview(output: &str, max_chars: usize) -> String {
    if output.chars().count() <= max_chars {
        return output.to_string();
    }
    let cut: String = output.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::events::JsonLinesSink;
    use crate::llm::ChatResponse;
    use crate::models::TokenUsage;
    use crate::tools::ToolDefinition;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Provider replaying canned responses; the last one repeats forever.
    struct ScriptedProvider {
        native: bool,
        script: Mutex<VecDeque<ChatResponse>>,
        repeat: ChatResponse,
        calls: Mutex<Vec<Vec<ConversationMessage>>>,
    }

    impl ScriptedProvider {
        fn new(native: bool, mut responses: Vec<ChatResponse>) -> Self {
            let repeat = responses.pop().unwrap_or_default();
            Self {
                native,
                script: Mutex::new(responses.into()),
                repeat,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, messages: &[ConversationMessage]) -> ChatResponse {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.repeat.clone())
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last_messages(&self) -> Vec<ConversationMessage> {
            self.calls.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        fn supports_native_tools(&self) -> bool {
            self.native
        }

        async fn chat_with_tools(
            &self,
            messages: &[ConversationMessage],
            _tools: &[ToolDefinition],
        ) -> Result<ChatResponse, ProviderError> {
            Ok(self.next(messages))
        }

        async fn chat(&self, messages: &[ConversationMessage]) -> Result<ChatResponse, ProviderError> {
            Ok(self.next(messages))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ChatProvider for FailingProvider {
        fn name(&self) -> &str {
            "Failing"
        }

        fn model(&self) -> &str {
            "none"
        }

        fn supports_native_tools(&self) -> bool {
            true
        }

        async fn chat_with_tools(
            &self,
            _messages: &[ConversationMessage],
            _tools: &[ToolDefinition],
        ) -> Result<ChatResponse, ProviderError> {
            Err(ProviderError::Timeout(1))
        }

        async fn chat(&self, _messages: &[ConversationMessage]) -> Result<ChatResponse, ProviderError> {
            Err(ProviderError::Timeout(1))
        }
    }

    fn text(content: &str) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            tool_calls: vec![],
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 2,
            },
        }
    }

    fn native_call(id: &str, name: &str, args: &str) -> ChatResponse {
        ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCallRequest::new(Some(id.to_string()), name, args)],
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 2,
            },
        }
    }

    fn widget_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("A.cs"),
            "class Widget { void Render() {} }\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("B.cs"),
            "class Consumer\n{\n    private Widget _widget = new Widget();\n}\n",
        )
        .unwrap();
        temp_dir
    }

    fn agent(provider: Arc<dyn ChatProvider>, root: &TempDir, max_iterations: usize) -> CodeQuestionAgent {
        CodeQuestionAgent::new(
            provider,
            ToolExecutionContext::new(root.path()),
            AgentConfig {
                max_iterations,
                ..AgentConfig::default()
            },
        )
    }

    #[test]
    fn test_text_reply_finishes_in_one_iteration() {
        let root = widget_tree();
        let provider = Arc::new(ScriptedProvider::new(true, vec![text("Widget lives in A.cs.")]));
        let agent = agent(provider.clone(), &root, 5);

        let result = tokio_test::block_on(agent.run("Where is Widget?", &CancellationToken::new())).unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.final_answer, "Widget lives in A.cs.");
        assert!(result.tool_calls.is_empty());
        assert!(!result.exhausted);
        assert_eq!(result.usage.total(), 12);
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_endless_tool_calls_hit_the_cap() {
        let root = widget_tree();
        let provider = Arc::new(ScriptedProvider::new(
            true,
            vec![native_call("call_1", "list_directory", "{}")],
        ));
        let agent = agent(provider.clone(), &root, 3);

        let result = tokio_test::block_on(agent.run("Explain everything", &CancellationToken::new())).unwrap();
        assert!(result.exhausted);
        assert_eq!(result.iterations, 3);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(result.tool_calls.len(), 3);
        assert_eq!(result.final_answer, prompts::exhaustion_answer(3));
    }

    #[test]
    fn test_native_tool_results_feed_back() {
        let root = widget_tree();
        let provider = Arc::new(ScriptedProvider::new(
            true,
            vec![
                native_call("call_1", "find_definition", r#"{"symbol": "Widget"}"#),
                text("Widget is declared in A.cs line 1."),
            ],
        ));
        let agent = agent(provider.clone(), &root, 5);

        let result = tokio_test::block_on(agent.run("Where is Widget?", &CancellationToken::new())).unwrap();
        assert_eq!(result.iterations, 2);
        assert_eq!(result.tool_calls[0].name, "find_definition");
        assert_eq!(result.tool_calls[0].iteration, 1);

        let history = provider.last_messages();
        assert_eq!(history.len(), 4);
        let ConversationMessage::ToolResult { call_id, content, .. } = &history[3] else {
            panic!("expected a tool result message");
        };
        assert_eq!(call_id.as_deref(), Some("call_1"));
        assert!(content.starts_with("Found 1 definition(s) for 'Widget':"));
        assert!(content.contains("A.cs:1"));
    }

    #[test]
    fn test_react_protocol_round_trip() {
        let root = widget_tree();
        let provider = Arc::new(ScriptedProvider::new(
            false,
            vec![
                text("Let me check.\n<tool_call>{\"name\": \"read_file\", \"arguments\": {\"path\": \"A.cs\"}}</tool_call>\n<tool_call>{broken</tool_call>\n<tool_call>{\"name\": \"nope\", \"arguments\": {}}</tool_call>"),
                text("Render is a method of Widget."),
            ],
        ));
        let agent = agent(provider.clone(), &root, 5);

        let result = tokio_test::block_on(agent.run("What is Render?", &CancellationToken::new())).unwrap();
        assert_eq!(result.final_answer, "Render is a method of Widget.");
        assert_eq!(result.tool_calls.len(), 2);
        assert!(result.files_touched.contains("A.cs"));
        assert_eq!(result.files_touched.len(), 1);

        let history = provider.last_messages();
        assert!(history[0].content().contains("<tool_call>"));
        let ConversationMessage::User { content } = &history[3] else {
            panic!("expected one user message with all results");
        };
        assert!(content.contains("<tool_result name=\"read_file\">\nA.cs (lines 1-1 of 1)"));
        assert!(content.contains("<tool_result name=\"nope\">\nError: Unknown tool 'nope'"));
    }

    #[test]
    fn test_native_disabled_forces_react() {
        let root = widget_tree();
        let provider = Arc::new(ScriptedProvider::new(true, vec![text("done")]));
        let agent = CodeQuestionAgent::new(
            provider,
            ToolExecutionContext::new(root.path()),
            AgentConfig {
                native_tools: false,
                ..AgentConfig::default()
            },
        );
        assert!(!agent.uses_native_tools());
    }

    #[test]
    fn test_provider_error_is_fatal_and_reported() {
        let root = widget_tree();
        let sink = Arc::new(JsonLinesSink::new(Vec::new()));
        let agent = agent(Arc::new(FailingProvider), &root, 5).with_sink(sink.clone());

        let error = tokio_test::block_on(agent.run("Anything", &CancellationToken::new())).unwrap_err();
        assert!(matches!(error, AgentError::Provider(ProviderError::Timeout(1))));

        drop(agent);
        let sink = Arc::try_unwrap(sink).ok().unwrap();
        let lines = String::from_utf8(sink.into_inner()).unwrap();
        let kinds: Vec<String> = lines
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["run_started", "run_error"]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let root = widget_tree();
        let provider = Arc::new(ScriptedProvider::new(true, vec![text("never")]));
        let agent = agent(provider.clone(), &root, 5);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = tokio_test::block_on(agent.run("Anything", &cancel)).unwrap_err();
        assert!(matches!(error, AgentError::Cancelled));
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }
}
