//! Name-keyed tool collection.

use crate::tools::{builtin_tools, Tool, ToolDefinition, ToolExecutionContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Tools available to one agent run, keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in exploration tool.
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        for tool in builtin_tools() {
            registry.register(tool);
        }
        registry
    }

    /// Add a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!("Replaced tool registration: {}", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Native function-calling schemas for every tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Text block describing every tool, for prompts that embed the catalogue.
    pub fn catalogue(&self) -> String {
        let mut text = String::new();
        for tool in self.tools.values() {
            let schema = serde_json::to_string(&tool.parameters()).unwrap_or_else(|_| "{}".to_string());
            text.push_str(&format!(
                "### {}\n{}\nParameters: {}\n\n",
                tool.name(),
                tool.description(),
                schema
            ));
        }
        text.trim_end().to_string()
    }

    /// Execute a tool by name. Unknown names produce an error result.
    pub fn execute(&self, name: &str, arguments_json: &str, ctx: &ToolExecutionContext) -> String {
        match self.get(name) {
            Some(tool) => tool.execute(arguments_json, ctx),
            None => format!(
                "Error: Unknown tool '{}'. Available tools: {}",
                name,
                self.names().join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolError;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    struct EchoTool(&'static str);

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "read_file"
        }

        fn description(&self) -> &str {
            "Echo"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }

        fn run(&self, _args: &Map<String, Value>, _ctx: &ToolExecutionContext) -> Result<String, ToolError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_builtin_tools_registered() {
        let registry = ToolRegistry::with_builtin_tools();
        assert_eq!(
            registry.names(),
            vec![
                "file_outline",
                "find_definition",
                "glob",
                "grep",
                "list_directory",
                "read_file",
                "related_files"
            ]
        );
        assert_eq!(registry.definitions().len(), 7);
        assert!(registry
            .definitions()
            .iter()
            .all(|d| d.tool_type == "function" && d.function.parameters["type"] == "object"));
    }

    #[test]
    fn test_last_registration_wins() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let mut registry = ToolRegistry::with_builtin_tools();
        registry.register(Arc::new(EchoTool("substituted")));

        assert_eq!(registry.names().len(), 7);
        assert_eq!(registry.execute("read_file", "{}", &ctx), "substituted");
    }

    #[test]
    fn test_unknown_tool_is_error_text() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolExecutionContext::new(temp_dir.path());
        let registry = ToolRegistry::with_builtin_tools();
        let output = registry.execute("delete_everything", "{}", &ctx);
        assert!(output.starts_with("Error: Unknown tool 'delete_everything'"));
    }

    #[test]
    fn test_catalogue_lists_every_tool() {
        let registry = ToolRegistry::with_builtin_tools();
        let catalogue = registry.catalogue();
        for name in registry.names() {
            assert!(catalogue.contains(&format!("### {}\n", name)));
        }
        assert!(catalogue.contains("\"required\":[\"pattern\"]"));
    }
}
