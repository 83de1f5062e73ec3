//! RepoAsk - ask an LLM questions about a source tree
//!
//! A CLI tool that lets a chat model explore a codebase with read-only
//! tools (listing, glob, grep, reading, outlines, definitions, related
//! files) until it can answer a natural-language question.
//!
//! Exit codes:
//!   0 - Answer produced (possibly the iteration-limit fallback)
//!   1 - Runtime error (connection, config, clone failure, etc.)
//!   130 - Cancelled with Ctrl-C

mod agent;
mod cli;
mod config;
mod llm;
mod models;
mod repo;
mod report;
mod scanner;
mod tools;

use agent::{AgentConfig, AgentError, CodeQuestionAgent, ConsoleProgress, JsonLinesSink, NullSink, ProgressSink};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use llm::ProviderSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tools::{ToolExecutionContext, ToolRegistry};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle the informational modes early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }
    if args.list_tools {
        println!("{}", ToolRegistry::with_builtin_tools().catalogue());
        return Ok(());
    }

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) if is_cancelled(&e) => {
            eprintln!("\nCancelled.");
            std::process::exit(130);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn is_cancelled(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<AgentError>(), Some(AgentError::Cancelled))
}

/// Handle --init-config: generate a default .repoask.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("Edit it to choose the provider, model, iteration limit and more.");
    Ok(())
}

/// Initialize logging. Logs go to stderr so stdout carries only output.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Answer the question end to end.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();
    let started_at = Utc::now();

    // Keep the clone alive until the run is over
    let clone = match args.repo {
        Some(ref url) => {
            eprintln!("Cloning repository: {}", url);
            let options = repo::CloneOptions {
                branch: args.branch.clone(),
                show_progress: !args.quiet && !args.events,
                ..repo::CloneOptions::default()
            };
            let url = url.clone();
            let cloned = tokio::task::spawn_blocking(move || repo::clone_repository(&url, options))
                .await
                .context("Clone task failed")??;
            Some(cloned)
        }
        None => None,
    };
    let root: PathBuf = match clone {
        Some(ref cloned) => cloned.path().to_path_buf(),
        None => args.root.clone(),
    };

    let (mut config, config_path) = Config::discover(args.config.as_deref(), &root)?;
    config.merge_with_args(&args);
    config.validate()?;

    init_logging(args.log_level(config.general.verbose));
    info!("RepoAsk v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(ref path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    let provider = llm::build_provider(
        config.model.provider,
        ProviderSettings {
            url: config.model.url.clone(),
            model: config.model.name.clone(),
            api_key: config.model.api_key.clone(),
            temperature: config.model.temperature,
            timeout_seconds: config.model.timeout_seconds,
        },
    )?;

    let mut context = ToolExecutionContext::new(&root);
    if config.tools.use_ripgrep {
        context = context.with_ripgrep_detection();
    }
    match context.ripgrep() {
        Some(rg) => info!("Using ripgrep at {}", rg.display()),
        None => info!("Searching in-process"),
    }

    let sink: Arc<dyn ProgressSink> = if args.events {
        Arc::new(JsonLinesSink::new(std::io::stdout()))
    } else if args.quiet {
        Arc::new(NullSink)
    } else {
        Arc::new(ConsoleProgress::new())
    };

    let agent = CodeQuestionAgent::new(
        provider.clone(),
        context,
        AgentConfig {
            max_iterations: config.agent.max_iterations,
            result_preview_chars: config.agent.result_preview_chars,
            native_tools: config.model.native_tools,
        },
    )
    .with_sink(sink);
    let protocol = if agent.uses_native_tools() { "native" } else { "react" };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            ctrl_c_cancel.cancel();
        }
    });

    let result = agent.run(args.question(), &cancel).await?;

    let metadata = report::RunMetadata {
        question: args.question().to_string(),
        root: match args.repo {
            Some(ref url) => repo::repo_label(url),
            None => root.display().to_string(),
        },
        provider: provider.name().to_string(),
        model: provider.model().to_string(),
        protocol: protocol.to_string(),
        started_at,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let output = report::render(config.general.format, &result, &metadata)?;

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)?;
            eprintln!("Answer saved to: {}", path.display());
        }
        // With --events stdout is the event stream; the answer is in run_finished
        None if args.events => {}
        None => print!("{}", output),
    }

    info!(
        "Finished in {:.1}s: {} iteration(s), {} tool call(s), {} tokens",
        start_time.elapsed().as_secs_f64(),
        result.iterations,
        result.tool_calls.len(),
        result.usage.total()
    );
    drop(clone);
    Ok(())
}
