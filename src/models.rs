//! Data models for an agent run.
//!
//! This module contains the value types shared by the tools, the
//! orchestrator and the report renderer: tool-call requests, the
//! conversation transcript, search hits, outline symbols and the
//! per-run result accumulator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::SystemTime;

/// A request from the model to invoke one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation token. Only present in the native protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Name of the tool, used as the registry dispatch key.
    pub function_name: String,
    /// Raw JSON text of the arguments object.
    pub arguments_json: String,
}

impl ToolCallRequest {
    pub fn new(
        call_id: Option<String>,
        function_name: impl Into<String>,
        arguments_json: impl Into<String>,
    ) -> Self {
        Self {
            call_id,
            function_name: function_name.into(),
            arguments_json: arguments_json.into(),
        }
    }
}

/// One message of the conversation held by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResult {
        #[serde(skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
        name: String,
        content: String,
    },
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Text content of the message regardless of its role.
    #[cfg(test)]
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::ToolResult { content, .. } => content,
        }
    }
}

/// A structural declaration extracted by the outline tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineSymbol {
    /// 1-based source line.
    pub line: usize,
    /// Nesting level relative to file scope (0 = top-level declaration).
    pub depth: usize,
    /// Cleaned single-line text of the declaration.
    pub signature: String,
}

/// A single search hit, kept with its file's modification time for ranking.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub absolute_path: PathBuf,
    pub relative_path: String,
    /// 1-based line number.
    pub line_number: usize,
    /// Trimmed, length-capped line text.
    pub line_text: String,
    pub modified: SystemTime,
}

/// Token counters accumulated over every provider call of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Audit entry for one executed tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    /// Iteration (1-based) in which the call was made.
    pub iteration: usize,
    pub name: String,
    pub arguments: String,
    /// Truncated preview of the textual result.
    pub result_preview: String,
    pub duration_ms: u64,
}

/// Outcome of one agent run, built up incrementally by the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentRunResult {
    pub final_answer: String,
    pub iterations: usize,
    pub tool_calls: Vec<ToolCallRecord>,
    pub usage: TokenUsage,
    /// Files read or inspected, relative to the run root.
    pub files_touched: BTreeSet<String>,
    /// True when the iteration cap was reached without a final answer.
    pub exhausted: bool,
}

impl AgentRunResult {
    /// Number of calls made to each tool, ordered by tool name.
    pub fn calls_by_tool(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for call in &self.tool_calls {
            *counts.entry(call.name.clone()).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}
