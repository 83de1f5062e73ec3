//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the
//! configuration file, then to built-in defaults.

use crate::llm::ProviderKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// RepoAsk - ask an LLM questions about a codebase
///
/// The model explores the source tree with read-only tools (directory
/// listing, glob, grep, file reading, outlines, definitions, related
/// files) and answers once it has seen enough.
///
/// Examples:
///   repoask "Where is the HTTP router configured?"
///   repoask --root ./my-project --model qwen2.5-coder:14b "How are errors logged?"
///   repoask --repo https://github.com/owner/repo.git "What does the Widget class do?"
///   repoask --provider openai --url https://api.openai.com --model gpt-4o-mini "..."
///   repoask --list-tools
///   repoask --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Question to answer about the code
    #[arg(value_name = "QUESTION", required_unless_present_any = ["init_config", "list_tools"])]
    pub question: Option<String>,

    /// Directory to explore
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Git repository URL to shallow-clone and explore instead of --root
    #[arg(short, long, value_name = "URL")]
    pub repo: Option<String>,

    /// Branch to check out when cloning with --repo
    #[arg(short, long, value_name = "BRANCH", requires = "repo")]
    pub branch: Option<String>,

    /// Chat API to use
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Model name
    ///
    /// Can also be set via REPOASK_MODEL or .repoask.toml.
    #[arg(short, long, env = "REPOASK_MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat API
    #[arg(long, env = "REPOASK_URL", value_name = "URL")]
    pub url: Option<String>,

    /// API key for OpenAI-compatible endpoints
    #[arg(long, env = "REPOASK_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum number of model turns before giving up
    #[arg(long, value_name = "COUNT")]
    pub max_iterations: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Use the <tool_call> text protocol even if the provider supports
    /// native function calling
    #[arg(long)]
    pub no_native_tools: bool,

    /// Search in-process instead of delegating to ripgrep
    #[arg(long)]
    pub no_ripgrep: bool,

    /// Output format (text, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the answer to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print progress events as JSON lines on stdout
    #[arg(long)]
    pub events: bool,

    /// Print the tool catalogue and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Generate a default .repoask.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .repoask.toml in the current directory,
    /// then in the explored directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (no progress, errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The answer only (default)
    #[default]
    Text,
    /// Answer plus exploration log
    Markdown,
    /// Full run result as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The question, trimmed. Empty when running --list-tools or --init-config.
    pub fn question(&self) -> &str {
        self.question.as_deref().map(str::trim).unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for the informational modes
        if self.init_config || self.list_tools {
            return Ok(());
        }

        if self.question().is_empty() {
            return Err("Question must not be empty".to_string());
        }

        // Validate repository URL format
        if let Some(ref repo) = self.repo {
            if !repo.starts_with("https://") && !repo.starts_with("git@") {
                return Err("Repository URL must start with 'https://' or 'git@'".to_string());
            }
        }

        // Validate API URL format
        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.max_iterations == Some(0) {
            return Err("Max iterations must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate root directory unless a clone provides it
        if self.repo.is_none() {
            if !self.root.exists() {
                return Err(format!(
                    "Root directory does not exist: {}",
                    self.root.display()
                ));
            }
            if !self.root.is_dir() {
                return Err(format!(
                    "Root path is not a directory: {}",
                    self.root.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
