//! Text protocol for models without native function calling.
//!
//! The model requests tools by writing
//! `<tool_call>{"name": "...", "arguments": {...}}</tool_call>` blocks;
//! results go back as `<tool_result name="...">...</tool_result>` blocks.

use crate::models::ToolCallRequest;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static TOOL_CALL_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tool_call>\s*(.*?)\s*</tool_call>").expect("valid regex"));

/// Every well-formed tool call in `text`, in order of appearance.
///
/// Blocks that are not JSON objects or have no non-empty `name` are
/// dropped silently. An empty result means the text is a final answer.
pub fn parse_tool_calls(text: &str) -> Vec<ToolCallRequest> {
    TOOL_CALL_BLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            let parsed = parse_block(body);
            if parsed.is_none() {
                debug!("Dropping malformed tool_call block: {}", body);
            }
            parsed
        })
        .collect()
}

fn parse_block(body: &str) -> Option<ToolCallRequest> {
    let Value::Object(object) = serde_json::from_str::<Value>(strip_code_fence(body)).ok()? else {
        return None;
    };
    let name = object.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let arguments = match object.get("arguments") {
        None | Some(Value::Null) => "{}".to_string(),
        Some(Value::String(raw)) => raw.clone(),
        Some(other) => other.to_string(),
    };
    Some(ToolCallRequest::new(None, name, arguments))
}

/// Models sometimes wrap the JSON in a Markdown fence inside the tags.
fn strip_code_fence(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Remove tool-call blocks, leaving the prose around them.
pub fn strip_tool_calls(text: &str) -> String {
    TOOL_CALL_BLOCK.replace_all(text, "").trim().to_string()
}

/// Serialize one turn's results into a single user message body.
pub fn format_tool_results(results: &[(String, String)]) -> String {
    results
        .iter()
        .map(|(name, output)| format!("<tool_result name=\"{}\">\n{}\n</tool_result>", name, output))
        .collect::<Vec<_>>()
        .join("\n\n")
}
