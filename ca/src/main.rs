//! codeagent - one-shot coding assistant
//!
//! CLI entry point: load config, run one conversation, print the answer.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use codeagent::cli::Cli;
use codeagent::config::Config;
use codeagent::llm::create_client;
use codeagent::prompts::{PromptContext, render_system_prompt};
use codeagent::r#loop::{ConversationLoop, LoopEvent, LoopOutcome};
use codeagent::tools::ToolRegistry;

fn setup_logging(verbose: bool) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codeagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(log_dir.join("codeagent.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Console output for `--verbose`
fn print_event(event: &LoopEvent) {
    match event {
        LoopEvent::ModelResponded { round, usage } => {
            println!("{}", format!("Round {}", round).dimmed());
            println!("Prompt tokens: {}", usage.input_tokens);
            println!("Response tokens: {}", usage.output_tokens);
        }
        LoopEvent::FunctionCalled { call } => {
            println!(" - Calling function: {}({})", call.name.cyan(), call.args);
        }
        LoopEvent::FunctionReturned { result } => {
            let output = if result.is_error {
                result.output.red().to_string()
            } else {
                result.output.clone()
            };
            println!("-> {}", output);
        }
    }
}

/// Quiet console output: just the function names
fn print_call(event: &LoopEvent) {
    if let LoopEvent::FunctionCalled { call } = event {
        println!(" - Calling function: {}", call.name);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")?
        .with_env_overrides()
        .context("Failed to apply environment overrides")?;
    config.validate().context("Invalid configuration")?;

    let working_dir = &config.sandbox.working_dir;
    if !working_dir.is_dir() {
        return Err(eyre::eyre!("Working directory not found: {}", working_dir.display()));
    }
    info!(working_dir = %working_dir.display(), model = %config.llm.model, "codeagent loaded config");

    let client = create_client(&config.llm).context("Failed to create model client")?;
    let registry = ToolRegistry::from_config(&config);
    let system_prompt = render_system_prompt(&PromptContext::from_config(&config))?;

    let prompt = cli.prompt_text();
    if cli.verbose {
        println!("User prompt: {}", prompt);
    }

    let engine = ConversationLoop::new(client, registry, system_prompt, &config.limits)
        .with_max_tokens(config.llm.max_tokens);
    let mut engine = if cli.verbose {
        engine.on_event(print_event)
    } else {
        engine.on_event(print_call)
    };

    let outcome = engine.run(&prompt).await.context("Model request failed")?;
    debug!(?outcome, "main: conversation finished");

    match outcome {
        LoopOutcome::Done { text, rounds } => {
            info!(rounds, "main: final response received");
            println!("Final response:");
            println!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        LoopOutcome::Aborted { max_rounds, .. } => {
            println!("Maximum iterations ({}) reached.", max_rounds);
            Ok(ExitCode::FAILURE)
        }
    }
}
