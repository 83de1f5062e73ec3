//! Paginated file reading with line numbers.

use crate::scanner::is_binary_file;
use crate::tools::{optional_usize, required_str, Tool, ToolError, ToolExecutionContext};
use serde_json::{json, Map, Value};
use std::fs;

const DEFAULT_MAX_LINES: usize = 500;
const MAX_LINE_CHARS: usize = 2000;
const MAX_OUTPUT_BYTES: usize = 50 * 1024;

pub struct ReadFileTool;

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file with line numbers. Returns up to 500 lines (or 50KB) starting at 'offset'; \
         the output always ends with a note saying whether more lines remain and which offset to use next. \
         Prefer file_outline first for large files."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file relative to the repository root"
                },
                "offset": {
                    "type": "integer",
                    "description": "0-based line to start from (default: 0)"
                },
                "max_lines": {
                    "type": "integer",
                    "description": "Maximum number of lines to return (default: 500)"
                }
            },
            "required": ["path"]
        })
    }

    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext) -> Result<String, ToolError> {
        let requested = required_str(args, "path")?.trim();
        let offset = optional_usize(args, "offset")?.unwrap_or(0);
        let max_lines = optional_usize(args, "max_lines")?
            .unwrap_or(DEFAULT_MAX_LINES)
            .max(1);

        let path = ctx.resolve(requested)?;
        if !path.exists() {
            return Err(ToolError::FileNotFound(requested.to_string()));
        }
        if !path.is_file() {
            return Err(ToolError::NotAFile(requested.to_string()));
        }
        let relative = ctx.relative(&path);
        if is_binary_file(&path) {
            return Ok(format!("[Binary file: {}]", relative));
        }

        let bytes = fs::read(&path).map_err(|source| ToolError::Io {
            path: requested.to_string(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.lines().collect();
        Ok(render_page(&relative, &lines, offset, max_lines))
    }
}

fn cap_line(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(MAX_LINE_CHARS).collect();
    format!("{}...", cut)
}

/// Render lines `offset..` until the line or byte budget is spent.
fn render_page(relative: &str, lines: &[&str], offset: usize, max_lines: usize) -> String {
    let total = lines.len();
    if offset >= total {
        return format!("(End of file — {} total lines)", total);
    }

    let mut body = String::new();
    let mut end = offset;
    let mut byte_limited = false;
    while end < total && end - offset < max_lines {
        let formatted = format!("{:>6}| {}\n", end + 1, cap_line(lines[end]));
        if body.len() + formatted.len() > MAX_OUTPUT_BYTES {
            byte_limited = true;
            break;
        }
        body.push_str(&formatted);
        end += 1;
    }

    let note = if byte_limited {
        format!(
            "(Output truncated at {}KB. Use offset={} to continue.)",
            MAX_OUTPUT_BYTES / 1024,
            end
        )
    } else if end < total {
        format!(
            "(File has {} more lines. Use offset={} to continue.)",
            total - end,
            end
        )
    } else {
        format!("(End of file — {} total lines)", total)
    };

    format!(
        "{} (lines {}-{} of {})\n\n{}\n{}",
        relative,
        offset + 1,
        end,
        total,
        body,
        note
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {}\n", i)).collect()
    }

    fn annotations(output: &str) -> usize {
        ["(Output truncated at", "more lines. Use offset=", "(End of file"]
            .iter()
            .filter(|marker| output.contains(*marker))
            .count()
    }

    #[test]
    fn test_read_small_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.rs"), "fn main() {\n    run();\n}\n").unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        let output = ReadFileTool.execute(r#"{"path": "a.rs"}"#, &ctx);
        assert!(output.starts_with("a.rs (lines 1-3 of 3)"));
        assert!(output.contains("     1| fn main() {\n"));
        assert!(output.contains("     2|     run();\n"));
        assert!(output.ends_with("(End of file — 3 total lines)"));
        assert_eq!(annotations(&output), 1);
    }

    #[test]
    fn test_paging_is_gapless() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("big.txt"), numbered(1200)).unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        let first = ReadFileTool.execute(r#"{"path": "big.txt"}"#, &ctx);
        assert!(first.contains("   500| line 500\n"));
        assert!(!first.contains("| line 501\n"));
        assert!(first.ends_with("(File has 700 more lines. Use offset=500 to continue.)"));

        let second = ReadFileTool.execute(r#"{"path": "big.txt", "offset": 500}"#, &ctx);
        assert!(second.contains("   501| line 501\n"));
        assert!(!second.contains("| line 500\n"));

        let last = ReadFileTool.execute(r#"{"path": "big.txt", "offset": 1000}"#, &ctx);
        assert!(last.contains("  1200| line 1200\n"));
        assert!(last.ends_with("(End of file — 1200 total lines)"));
        assert_eq!(annotations(&last), 1);
    }

    #[test]
    fn test_byte_budget() {
        let temp_dir = TempDir::new().unwrap();
        let long_line = "x".repeat(1000);
        let body: String = (0..100).map(|_| format!("{}\n", long_line)).collect();
        fs::write(temp_dir.path().join("wide.txt"), body).unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        let output = ReadFileTool.execute(r#"{"path": "wide.txt"}"#, &ctx);
        // Each rendered line is 1009 bytes, so 50 fit in 50KB.
        assert!(output.ends_with("(Output truncated at 50KB. Use offset=50 to continue.)"));
        assert_eq!(annotations(&output), 1);
    }

    #[test]
    fn test_offset_past_end() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), numbered(3)).unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let output = ReadFileTool.execute(r#"{"path": "a.txt", "offset": 10}"#, &ctx);
        assert_eq!(output, "(End of file — 3 total lines)");
    }

    #[test]
    fn test_binary_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("logo.png"), [0u8, 159, 146, 150]).unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        assert_eq!(
            ReadFileTool.execute(r#"{"path": "logo.png"}"#, &ctx),
            "[Binary file: logo.png]"
        );
        assert_eq!(
            ReadFileTool.execute(r#"{"path": "nope.rs"}"#, &ctx),
            "Error: File not found: nope.rs"
        );
        assert!(ReadFileTool
            .execute(r#"{"path": "../../etc/passwd"}"#, &ctx)
            .starts_with("Error: Access denied"));
    }
}
