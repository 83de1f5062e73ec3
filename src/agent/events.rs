//! Progress events emitted while an agent run is in flight.
//!
//! Events are a side channel: sinks observe the run but cannot change it.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Maximum number of result lines carried as bullets in `ToolCallEnded`.
const MAX_BULLETS: usize = 5;
const MAX_SUMMARY_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    RunStarted {
        question: String,
        root: String,
        provider: String,
        model: String,
        protocol: String,
    },
    ToolCallStarted {
        iteration: usize,
        name: String,
        arguments: String,
        summary: String,
    },
    ToolCallEnded {
        iteration: usize,
        name: String,
        arguments: String,
        summary: String,
        result_summary: String,
        bullets: Vec<String>,
        duration_ms: u64,
    },
    RunFinished {
        answer: String,
        iterations: usize,
        tool_calls: usize,
        total_tokens: u64,
        exhausted: bool,
    },
    RunError {
        message: String,
    },
}

/// Receiver of [`AgentEvent`]s.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &AgentEvent);
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &AgentEvent) {}
}

/// Spinner on stderr showing the tool currently running.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: &AgentEvent) {
        match event {
            AgentEvent::RunStarted { model, .. } => {
                self.bar.enable_steady_tick(Duration::from_millis(100));
                self.bar.set_message(format!("Thinking ({})...", model));
            }
            AgentEvent::ToolCallStarted {
                iteration, summary, ..
            } => {
                self.bar.set_message(format!("[{}] {}", iteration, summary));
            }
            AgentEvent::ToolCallEnded {
                iteration,
                summary,
                result_summary,
                duration_ms,
                ..
            } => {
                self.bar.println(format!(
                    "  [{}] {} -> {} ({}ms)",
                    iteration, summary, result_summary, duration_ms
                ));
                self.bar.set_message("Thinking...");
            }
            AgentEvent::RunFinished {
                iterations,
                tool_calls,
                ..
            } => {
                self.bar.finish_with_message(format!(
                    "Done in {} iteration(s), {} tool call(s)",
                    iterations, tool_calls
                ));
            }
            AgentEvent::RunError { message } => {
                self.bar.abandon_with_message(format!("Failed: {}", message));
            }
        }
    }
}

/// Writes each event as one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ProgressSink for JsonLinesSink<W> {
    fn emit(&self, event: &AgentEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Event output is best effort; a closed pipe must not abort the run.
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }
}

/// Short human label for a tool call, e.g. `grep "Widget" in *.cs`.
pub fn call_summary(name: &str, arguments_json: &str) -> String {
    let args: serde_json::Map<String, Value> = serde_json::from_str(arguments_json).unwrap_or_default();
    let text = |key: &str| args.get(key).and_then(Value::as_str).map(str::trim);

    let summary = match name {
        "grep" => match (text("pattern"), text("include")) {
            (Some(p), Some(i)) if !i.is_empty() => format!("grep \"{}\" in {}", p, i),
            (Some(p), _) => format!("grep \"{}\"", p),
            _ => "grep".to_string(),
        },
        "find_definition" => format!("find_definition {}", text("symbol").unwrap_or("?")),
        "glob" => format!("glob {}", text("pattern").unwrap_or("?")),
        "list_directory" => format!("list_directory {}", text("path").filter(|p| !p.is_empty()).unwrap_or(".")),
        _ => match text("path") {
            Some(path) => format!("{} {}", name, path),
            None => name.to_string(),
        },
    };
    clip(&summary)
}

/// First line of a tool result plus up to five following non-empty lines.
pub fn result_summary(result: &str) -> (String, Vec<String>) {
    let mut lines = result.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next().map(clip).unwrap_or_default();
    let bullets = lines.take(MAX_BULLETS).map(clip).collect();
    (first, bullets)
}

fn clip(text: &str) -> String {
    crate::tools::truncate_line(text, MAX_SUMMARY_CHARS)
}
