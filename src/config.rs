//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.repoask.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::llm::ProviderKind;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and in the run root.
pub const CONFIG_FILE_NAME: &str = ".repoask.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Tool settings.
    #[serde(default)]
    pub tools: ToolSettings,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which chat API to talk to.
    #[serde(default)]
    pub provider: ProviderKind,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the API.
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer key for OpenAI-compatible endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Use structured function calling when the provider supports it.
    /// If false the `<tool_call>` text protocol is always used.
    #[serde(default = "default_true")]
    pub native_tools: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            name: default_model(),
            url: default_url(),
            api_key: None,
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            native_tools: true,
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Hard cap on model turns per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Characters of each tool result kept in the exploration log.
    #[serde(default = "default_preview_chars")]
    pub result_preview_chars: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            result_preview_chars: default_preview_chars(),
        }
    }
}

fn default_max_iterations() -> usize {
    15
}

fn default_preview_chars() -> usize {
    500
}

/// Tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Delegate search to `rg` when it is on PATH.
    #[serde(default = "default_true")]
    pub use_ripgrep: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self { use_ripgrep: true }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Find and load the configuration for a run.
    ///
    /// Lookup order: `explicit`, then `./.repoask.toml`, then
    /// `<root>/.repoask.toml`. Returns the path that was used, if any.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        for candidate in [PathBuf::from(CONFIG_FILE_NAME), root.join(CONFIG_FILE_NAME)] {
            if candidate.is_file() {
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.url {
            self.model.url = url.clone();
        }
        if let Some(ref key) = args.api_key {
            self.model.api_key = Some(key.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(max_iterations) = args.max_iterations {
            self.agent.max_iterations = max_iterations;
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags only ever switch things on or off explicitly
        if args.no_native_tools {
            self.model.native_tools = false;
        }
        if args.no_ripgrep {
            self.tools.use_ripgrep = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged settings. The command line rejects the same values,
    /// but a config file can still supply them.
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            bail!("Invalid configuration: agent.max_iterations must be at least 1");
        }
        if self.model.timeout_seconds == 0 {
            bail!("Invalid configuration: model.timeout_seconds must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.model.temperature) {
            bail!("Invalid configuration: model.temperature must be between 0.0 and 1.0");
        }
        if !self.model.url.starts_with("http://") && !self.model.url.starts_with("https://") {
            bail!("Invalid configuration: model.url must start with 'http://' or 'https://'");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
