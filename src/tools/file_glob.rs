//! File discovery by glob pattern.

use crate::scanner::IncludeFilter;
use crate::tools::search::find_files;
use crate::tools::{required_str, Tool, ToolError, ToolExecutionContext};
use serde_json::{json, Map, Value};

const MAX_RESULTS: usize = 100;

pub struct GlobTool;

impl Tool for GlobTool {
    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "Find files by glob pattern (e.g. '**/*.cs', 'src/**/test_*.py', '*Controller*'). \
         Results are sorted by modification time, newest first, and capped at 100."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern. Patterns without '/' match file names at any depth."
                }
            },
            "required": ["pattern"]
        })
    }

    fn run(&self, args: &Map<String, Value>, ctx: &ToolExecutionContext) -> Result<String, ToolError> {
        let pattern = required_str(args, "pattern")?.trim();
        let filter = IncludeFilter::parse(pattern).map_err(|e| ToolError::InvalidArgument {
            name: "pattern",
            reason: e.to_string(),
        })?;

        let files = find_files(ctx, &filter);
        if files.is_empty() {
            return Ok(format!("No files found matching pattern: {}", pattern));
        }

        let total = files.len();
        let shown = total.min(MAX_RESULTS);
        let mut output = format!("Found {} file(s) matching '{}':\n\n", total, pattern);
        for file in files.iter().take(MAX_RESULTS) {
            output.push_str(&file.relative);
            output.push('\n');
        }
        if total > MAX_RESULTS {
            output.push_str(&format!(
                "\n(Results truncated: showing {} of {} files. Use a more specific pattern to narrow the search.)\n",
                shown, total
            ));
        }
        Ok(output)
    }
}
