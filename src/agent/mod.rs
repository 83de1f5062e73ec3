//! The question-answering agent.
//!
//! This module provides the tool-calling loop, the two turn protocols
//! (native function calling and the `<tool_call>` text fallback) and the
//! progress events a presentation layer can subscribe to.

pub mod agent_loop;
pub mod events;
pub mod prompts;
pub mod react;
pub mod turn;

pub use agent_loop::{AgentConfig, AgentError, CodeQuestionAgent};
pub use events::{ConsoleProgress, JsonLinesSink, NullSink, ProgressSink};
