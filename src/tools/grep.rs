//! Regex content search across code files.

use crate::scanner::IncludeFilter;
use crate::tools::search::{file_count, format_grouped, search_content, ContentQuery};
use crate::tools::{optional_str, required_str, Tool, ToolError, ToolExecutionContext};
use serde_json::{json, Map, Value};

const MAX_MATCHES: usize = 100;

pub struct GrepTool;

impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search file contents with a regular expression (case-insensitive). Only code files are searched. \
         Matches are grouped by file, most recently modified files first, capped at 100 matches. \
         Use 'include' to restrict the search to files matching a glob such as '*.cs'."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for. Invalid expressions are searched literally."
                },
                "include": {
                    "type": "string",
                    "description": "Optional glob restricting which files are searched, e.g. '*.ts' or 'src/**/*.go'"
                }
            },
            "required": ["pattern"]
        })
    }

    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext) -> Result<String, ToolError> {
        let pattern = required_str(args, "pattern")?;
        let include = optional_str(args, "include")
            .map(IncludeFilter::parse)
            .transpose()
            .map_err(|e| ToolError::InvalidArgument {
                name: "include",
                reason: e.to_string(),
            })?;

        let query = ContentQuery {
            pattern,
            case_insensitive: true,
            include: include.as_ref(),
            limit: MAX_MATCHES,
            line_filter: None,
        };
        let outcome = search_content(ctx, &query).map_err(|e| ToolError::InvalidArgument {
            name: "pattern",
            reason: e.to_string(),
        })?;

        if outcome.matches.is_empty() {
            return Ok(format!("No matches found for pattern: {}", pattern));
        }

        let mut output = format!(
            "Found {} match(es) in {} file(s)\n",
            outcome.matches.len(),
            file_count(&outcome.matches)
        );
        if outcome.literal_fallback {
            output.push_str("(Pattern is not a valid regular expression; searched as literal text.)\n");
        }
        output.push('\n');
        output.push_str(&format_grouped(&outcome.matches));
        if outcome.truncated {
            output.push_str(&format!(
                "\n(Results truncated at {} matches. Use a more specific pattern or an include filter to narrow the search.)\n",
                MAX_MATCHES
            ));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

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

    #[test]
    fn test_grep_single_match() {
        let temp_dir = widget_tree();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let output = GrepTool.execute(r#"{"pattern": "Render"}"#, &ctx);

        assert!(output.starts_with("Found 1 match(es) in 1 file(s)"));
        assert!(output.contains("A.cs:\n  Line 1: class Widget { void Render() {} }"));
        assert!(!output.contains("B.cs"));
    }

    #[test]
    fn test_grep_is_case_insensitive_and_filtered() {
        let temp_dir = widget_tree();
        fs::write(temp_dir.path().join("notes.md"), "widget docs\n").unwrap();
        fs::write(temp_dir.path().join("widget.ts"), "export const WIDGET = 1;\n").unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        let output = GrepTool.execute(r#"{"pattern": "widget", "include": "*.cs"}"#, &ctx);
        assert!(output.starts_with("Found 2 match(es) in 2 file(s)"));
        assert!(!output.contains("notes.md"));
        assert!(!output.contains("widget.ts"));
    }

    #[test]
    fn test_grep_invalid_regex_is_literal() {
        let temp_dir = widget_tree();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let output = GrepTool.execute(r#"{"pattern": "Render("}"#, &ctx);

        assert!(output.starts_with("Found 1 match(es)"));
        assert!(output.contains("searched as literal text"));
    }

    #[test]
    fn test_grep_truncation_notice() {
        let temp_dir = TempDir::new().unwrap();
        let body: String = (0..120).map(|i| format!("let hit_{} = {};\n", i, i)).collect();
        fs::write(temp_dir.path().join("many.rs"), body).unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());

        let output = GrepTool.execute(r#"{"pattern": "hit_"}"#, &ctx);
        assert!(output.starts_with("Found 100 match(es) in 1 file(s)"));
        assert!(output.contains("(Results truncated at 100 matches."));
    }

    #[test]
    fn test_grep_no_matches() {
        let temp_dir = widget_tree();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        assert_eq!(
            GrepTool.execute(r#"{"pattern": "Gadget"}"#, &ctx),
            "No matches found for pattern: Gadget"
        );
    }
}
