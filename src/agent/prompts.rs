//! System prompts for the two turn protocols.

use crate::tools::ToolRegistry;

/// Guidance shared by both protocols.
const EXPLORATION_GUIDANCE: &str = r#"You are an expert software engineer answering questions about a source code repository.
You cannot see the code directly; explore it with the tools available to you, then answer.

## How to explore

1. Get oriented with list_directory or glob when you do not know where things live.
2. Use find_definition to locate where a type or function is declared, and grep for usages or text.
3. Prefer file_outline over read_file to understand a file's structure cheaply.
4. Read only the parts of files you need; read_file supports offset and max_lines for paging.
5. Use related_files to see what a file imports and which files reference it.

## Answering

- Answer as soon as you have enough evidence. Do not keep exploring for its own sake.
- Cite files with their repository-relative paths and line numbers where useful.
- If the code does not answer the question, say so and describe what you found.
- Tool errors start with "Error:". Read them and adjust your next call."#;

const REACT_PROTOCOL: &str = r#"## Calling tools

To call a tool, write a block exactly like this:

<tool_call>{"name": "tool_name", "arguments": {"param": "value"}}</tool_call>

You may write several tool_call blocks in one reply. They run in the order written.
Results come back in the next message as <tool_result name="tool_name">...</tool_result> blocks.
When you are ready to answer, reply with the answer only and no tool_call blocks."#;

/// Prompt for providers with native function calling.
pub fn native_system_prompt() -> String {
    EXPLORATION_GUIDANCE.to_string()
}

/// Prompt embedding the tool catalogue and the text call convention.
pub fn react_system_prompt(registry: &ToolRegistry) -> String {
    format!(
        "{}\n\n## Available tools\n\n{}\n\n{}",
        EXPLORATION_GUIDANCE,
        registry.catalogue(),
        REACT_PROTOCOL
    )
}

/// First user message of a run.
pub fn question_message(question: &str) -> String {
    format!("Question about the repository:\n\n{}", question.trim())
}

/// Answer substituted when the iteration cap is reached.
pub fn exhaustion_answer(max_iterations: usize) -> String {
    format!(
        "I wasn't able to reach a final answer within the exploration budget of {} steps. \
         Try asking a more specific question, or raise the iteration limit with --max-iterations.",
        max_iterations
    )
}
