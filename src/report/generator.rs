//! Answer rendering.
//!
//! This module renders an [`AgentRunResult`] as plain text, as a Markdown
//! report with the exploration log, or as JSON.

use crate::cli::OutputFormat;
use crate::models::{AgentRunResult, ToolCallRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Context of a run that is not part of the result itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub question: String,
    /// Directory explored, or the cloned URL.
    pub root: String,
    pub provider: String,
    pub model: String,
    /// `native` or `react`.
    pub protocol: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a RunMetadata,
    #[serde(flatten)]
    result: &'a AgentRunResult,
}

/// Render in the requested format.
pub fn render(format: OutputFormat, result: &AgentRunResult, metadata: &RunMetadata) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => generate_text_report(result),
        OutputFormat::Markdown => generate_markdown_report(result, metadata),
        OutputFormat::Json => generate_json_report(result, metadata)?,
    })
}

/// The answer alone.
pub fn generate_text_report(result: &AgentRunResult) -> String {
    format!("{}\n", result.final_answer.trim_end())
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(result: &AgentRunResult, metadata: &RunMetadata) -> String {
    let mut output = String::new();

    output.push_str("# RepoAsk Answer\n\n");
    output.push_str(&format!("> {}\n\n", metadata.question.replace('\n', "\n> ")));

    output.push_str("## Answer\n\n");
    output.push_str(result.final_answer.trim());
    output.push_str("\n\n");
    if result.exhausted {
        output.push_str("*The iteration limit was reached before the model produced an answer.*\n\n");
    }

    output.push_str(&generate_exploration_section(&result.tool_calls));
    output.push_str(&generate_files_section(result));
    output.push_str(&generate_usage_section(result));
    output.push_str(&generate_metadata_section(metadata, result));
    output.push_str(&generate_footer());

    output
}

/// Generate the exploration log table.
fn generate_exploration_section(calls: &[ToolCallRecord]) -> String {
    let mut section = String::new();

    section.push_str("## Exploration\n\n");
    if calls.is_empty() {
        section.push_str("The model answered without using any tools.\n\n");
        return section;
    }

    section.push_str("| Step | Tool | Arguments | Duration | Result |\n");
    section.push_str("|---:|---|---|---:|---|\n");
    for call in calls {
        let first_line = call.result_preview.lines().next().unwrap_or("");
        section.push_str(&format!(
            "| {} | `{}` | `{}` | {}ms | {} |\n",
            call.iteration,
            call.name,
            escape_cell(&call.arguments),
            call.duration_ms,
            escape_cell(first_line)
        ));
    }
    section.push('\n');

    section
}

/// Generate the list of files the model looked at.
fn generate_files_section(result: &AgentRunResult) -> String {
    if result.files_touched.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Files Touched\n\n");
    for path in &result.files_touched {
        section.push_str(&format!("- `{}`\n", path));
    }
    section.push('\n');

    section
}

/// Generate the token and tool usage summary.
fn generate_usage_section(result: &AgentRunResult) -> String {
    let mut section = String::new();

    section.push_str("## Usage\n\n");
    section.push_str("| Input tokens | Output tokens | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | **{}** |\n\n",
        result.usage.input_tokens,
        result.usage.output_tokens,
        result.usage.total()
    ));

    let by_tool = result.calls_by_tool();
    if !by_tool.is_empty() {
        let counts: Vec<String> = by_tool
            .iter()
            .map(|(name, count)| format!("`{}` x{}", name, count))
            .collect();
        section.push_str(&format!("Tool calls: {}\n\n", counts.join(", ")));
    }

    section
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &RunMetadata, result: &AgentRunResult) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Root:** {}\n", metadata.root));
    section.push_str(&format!(
        "- **Model:** `{}` via {} ({} tool calling)\n",
        metadata.model, metadata.provider, metadata.protocol
    ));
    section.push_str(&format!(
        "- **Date:** {}\n",
        metadata.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Iterations:** {}\n", result.iterations));
    section.push_str(&format!("- **Duration:** {:.1}s\n", metadata.duration_seconds));
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Generated by RepoAsk*\n".to_string()
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('`', "'").replace('\n', " ")
}

/// Generate a JSON report.
pub fn generate_json_report(result: &AgentRunResult, metadata: &RunMetadata) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport { metadata, result }).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenUsage;
    use tempfile::TempDir;

    fn create_test_result() -> AgentRunResult {
        AgentRunResult {
            final_answer: "`Widget` is declared in A.cs.\n".to_string(),
            iterations: 2,
            tool_calls: vec![ToolCallRecord {
                iteration: 1,
                name: "find_definition".to_string(),
                arguments: r#"{"symbol":"Widget"}"#.to_string(),
                result_preview: "Found 1 definition(s) for 'Widget':\n\nA.cs:1".to_string(),
                duration_ms: 4,
            }],
            usage: TokenUsage {
                input_tokens: 300,
                output_tokens: 40,
            },
            files_touched: ["A.cs".to_string()].into_iter().collect(),
            exhausted: false,
        }
    }

    fn create_test_metadata() -> RunMetadata {
        RunMetadata {
            question: "Where is Widget?".to_string(),
            root: "/tmp/project".to_string(),
            provider: "Ollama".to_string(),
            model: "test-model".to_string(),
            protocol: "native".to_string(),
            started_at: Utc::now(),
            duration_seconds: 3.5,
        }
    }

    #[test]
    fn test_generate_text_report() {
        assert_eq!(
            generate_text_report(&create_test_result()),
            "`Widget` is declared in A.cs.\n"
        );
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_result(), &create_test_metadata());

        assert!(markdown.starts_with("# RepoAsk Answer\n\n> Where is Widget?\n"));
        assert!(markdown.contains("## Answer\n\n`Widget` is declared in A.cs.\n"));
        assert!(markdown.contains(
            "| 1 | `find_definition` | `{\"symbol\":\"Widget\"}` | 4ms | Found 1 definition(s) for 'Widget': |"
        ));
        assert!(markdown.contains("- `A.cs`"));
        assert!(markdown.contains("| 300 | 40 | **340** |"));
        assert!(markdown.contains("Tool calls: `find_definition` x1"));
        assert!(markdown.contains("- **Duration:** 3.5s"));
        assert!(!markdown.contains("iteration limit"));
    }

    #[test]
    fn test_markdown_without_tools() {
        let result = AgentRunResult {
            final_answer: "No idea.".to_string(),
            iterations: 1,
            ..Default::default()
        };
        let markdown = generate_markdown_report(&result, &create_test_metadata());
        assert!(markdown.contains("The model answered without using any tools."));
        assert!(!markdown.contains("## Files Touched"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc `d`"), "a\\|b c 'd'");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_result(), &create_test_metadata()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["model"], "test-model");
        assert_eq!(value["final_answer"], "`Widget` is declared in A.cs.\n");
        assert_eq!(value["tool_calls"][0]["name"], "find_definition");
        assert_eq!(value["usage"]["input_tokens"], 300);
        assert_eq!(value["files_touched"][0], "A.cs");
    }

    #[test]
    fn test_write_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("answer.md");
        write_report("hello\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello\n");
    }
}
