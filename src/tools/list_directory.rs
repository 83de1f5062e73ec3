//! Depth-bounded directory tree.

use crate::scanner::{is_excluded_dir, is_listed_file};
use crate::tools::{optional_str, optional_usize, Tool, ToolError, ToolExecutionContext};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

const DEFAULT_DEPTH: usize = 3;
const MAX_FILES_PER_DIR: usize = 30;

pub struct ListDirectoryTool;

impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the directory tree of the repository (or a subdirectory) to understand its layout. \
         Build, dependency and VCS folders are skipped; at most 30 files are shown per directory."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory relative to the repository root. Defaults to the root."
                },
                "max_depth": {
                    "type": "integer",
                    "description": "How many directory levels to expand (default: 3)"
                }
            },
            "required": []
        })
    }

    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext) -> Result<String, ToolError> {
        let requested = optional_str(args, "path").unwrap_or(".");
        let max_depth = optional_usize(args, "max_depth")?.unwrap_or(DEFAULT_DEPTH).max(1);

        let dir = ctx.resolve(requested)?;
        if !dir.exists() {
            return Err(ToolError::DirectoryNotFound(requested.to_string()));
        }
        if !dir.is_dir() {
            return Err(ToolError::NotADirectory(requested.to_string()));
        }

        let label = match ctx.relative(&dir) {
            rel if rel.is_empty() => ".".to_string(),
            rel => rel,
        };
        let mut output = format!("{}/\n", label);
        render_dir(&dir, 1, max_depth, &mut output).map_err(|source| ToolError::Io {
            path: requested.to_string(),
            source,
        })?;
        Ok(output)
    }
}

/// Append the contents of `dir` at `level` (1 = direct children).
fn render_dir(dir: &Path, level: usize, max_depth: usize, output: &mut String) -> std::io::Result<()> {
    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !is_excluded_dir(&name) {
                subdirs.push((name, entry.path()));
            }
        } else if is_listed_file(&entry.path()) {
            files.push(name);
        }
    }
    subdirs.sort();
    files.sort();

    let indent = "  ".repeat(level);
    for (name, path) in subdirs {
        output.push_str(&format!("{}{}/\n", indent, name));
        if level < max_depth {
            // Unreadable subdirectories are shown but not expanded.
            let _ = render_dir(&path, level + 1, max_depth, output);
        }
    }

    let total = files.len();
    for name in files.iter().take(MAX_FILES_PER_DIR) {
        output.push_str(&format!("{}{}\n", indent, name));
    }
    if total > MAX_FILES_PER_DIR {
        output.push_str(&format!(
            "{}...and {} more files\n",
            indent,
            total - MAX_FILES_PER_DIR
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(ctx: &ToolExecutionContext, args: &str) -> String {
        ListDirectoryTool.execute(args, ctx)
    }

    #[test]
    fn test_tree_prunes_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/core")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("node_modules/x")).unwrap();
        fs::write(root.join("src/core/engine.rs"), "").unwrap();
        fs::write(root.join("src/b.rs"), "").unwrap();
        fs::write(root.join("src/a.rs"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();
        fs::write(root.join("photo.png"), "").unwrap();

        let ctx = ToolExecutionContext::new(root);
        let output = run(&ctx, "{}");

        assert_eq!(
            output,
            "./\n  src/\n    core/\n      engine.rs\n    a.rs\n    b.rs\n  README.md\n"
        );
    }

    #[test]
    fn test_depth_limit_lists_but_does_not_expand() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/deep.rs"), "").unwrap();

        let ctx = ToolExecutionContext::new(root);
        let output = run(&ctx, r#"{"max_depth": 1}"#);

        assert!(output.contains("  a/\n"));
        assert!(!output.contains("b/"));
        assert!(!output.contains("deep.rs"));
    }

    #[test]
    fn test_file_cap_marker() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..35 {
            fs::write(temp_dir.path().join(format!("f{:02}.rs", i)), "").unwrap();
        }
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let output = run(&ctx, "{}");

        assert!(output.contains("f29.rs"));
        assert!(!output.contains("f30.rs"));
        assert!(output.contains("...and 5 more files"));
    }

    #[test]
    fn test_missing_directory_is_text_error() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let output = run(&ctx, r#"{"path": "nope"}"#);
        assert_eq!(output, "Error: Directory not found: nope");
    }
}
