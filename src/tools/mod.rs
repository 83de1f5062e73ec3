//! Code-exploration tools exposed to the model.
//!
//! Every tool implements [`Tool`]: a stable name, a description, a JSON
//! schema for its arguments and an execution function that maps
//! `(arguments JSON, context)` to plain text. Failures are reported as
//! text starting with `Error:` so the model can read them and react.

pub mod find_definition;
pub mod file_glob;
pub mod grep;
pub mod languages;
pub mod list_directory;
pub mod outline;
pub mod read_file;
pub mod registry;
pub mod related_files;
pub mod search;

pub use registry::ToolRegistry;

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tool definition in the function-calling format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Failure of a single tool invocation. Never crosses the tool boundary:
/// [`Tool::execute`] renders it as text.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Arguments must be a JSON object")]
    ArgumentsNotObject,

    #[error("Missing required parameter: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Access denied: path outside repository root: {0}")]
    OutsideRoot(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only state shared by every tool call of one agent run.
#[derive(Debug, Clone)]
pub struct ToolExecutionContext {
    root: PathBuf,
    ripgrep: Option<PathBuf>,
}

impl ToolExecutionContext {
    /// Context scoped to `root`, searching in-process.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            ripgrep: None,
        }
    }

    /// Delegate file discovery and search to `rg` when it is on PATH.
    pub fn with_ripgrep_detection(mut self) -> Self {
        self.ripgrep = which::which("rg").ok();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ripgrep(&self) -> Option<&Path> {
        self.ripgrep.as_deref()
    }

    /// Resolve a user-supplied path against the root, refusing escapes.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ToolError> {
        let trimmed = path.trim();
        let candidate = if trimmed.is_empty() || trimmed == "." {
            self.root.clone()
        } else {
            let p = Path::new(trimmed);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                self.root.join(p)
            }
        };

        let within = match std::fs::canonicalize(&candidate) {
            Ok(canonical) => canonical.starts_with(&self.root),
            // Missing paths are reported by the tool itself.
            Err(_) => lexically_within(&self.root, &candidate),
        };
        if !within {
            return Err(ToolError::OutsideRoot(path.to_string()));
        }
        Ok(candidate)
    }

    pub fn relative(&self, path: &Path) -> String {
        crate::scanner::relative_path(&self.root, path)
    }
}

fn lexically_within(root: &Path, candidate: &Path) -> bool {
    use std::path::Component;
    let Ok(rel) = candidate.strip_prefix(root) else {
        return false;
    };
    let mut depth: i32 = 0;
    for component in rel.components() {
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    true
}

/// Capability contract of an exploration operation.
pub trait Tool: Send + Sync {
    /// Stable identifier, used as the dispatch key and function name.
    fn name(&self) -> &str;

    /// Natural-language description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Run the tool against parsed arguments.
    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext)
        -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            },
        }
    }

    /// Execute with raw JSON arguments. Never fails: errors become text.
    fn execute(&self, arguments_json: &str, ctx: &ToolExecutionContext) -> String {
        let result = parse_arguments(arguments_json).and_then(|args| self.run(&args, ctx));
        match result {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }
}

/// Parse an arguments object. Empty text is treated as `{}`.
pub fn parse_arguments(arguments_json: &str) -> Result<Map<String, Value>, ToolError> {
    let trimmed = arguments_json.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(trimmed)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ToolError::ArgumentsNotObject),
    }
}

/// Required non-empty string argument.
pub fn required_str<'a>(
    args: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(ToolError::MissingArgument(name)),
        Some(_) => Err(ToolError::InvalidArgument {
            name,
            reason: "expected a string".to_string(),
        }),
    }
}

/// Optional string argument; blank strings count as absent.
pub fn optional_str<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Optional non-negative integer argument. Numeric strings are accepted
/// because models frequently quote numbers.
pub fn optional_usize(
    args: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<usize>, ToolError> {
    let invalid = |reason: &str| ToolError::InvalidArgument {
        name,
        reason: reason.to_string(),
    };
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => Ok(Some(v as usize)),
            None if n.as_f64().map(|f| f >= 0.0).unwrap_or(false) => {
                Ok(n.as_f64().map(|f| f as usize))
            }
            None => Err(invalid("expected a non-negative integer")),
        },
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| invalid("expected a non-negative integer")),
        Some(_) => Err(invalid("expected a non-negative integer")),
    }
}

/// Trim a line and cap it at `max` characters, appending `...` when cut.
pub fn truncate_line(line: &str, max: usize) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max).collect();
    format!("{}...", cut)
}

/// Every built-in tool, in catalogue order.
pub fn builtin_tools() -> Vec<std::sync::Arc<dyn Tool>> {
    vec![
        std::sync::Arc::new(list_directory::ListDirectoryTool),
        std::sync::Arc::new(file_glob::GlobTool),
        std::sync::Arc::new(grep::GrepTool),
        std::sync::Arc::new(read_file::ReadFileTool),
        std::sync::Arc::new(outline::FileOutlineTool),
        std::sync::Arc::new(find_definition::FindDefinitionTool),
        std::sync::Arc::new(related_files::RelatedFilesTool),
    ]
}
