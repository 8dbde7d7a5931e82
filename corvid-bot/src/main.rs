//! Corvid CLI - Personal Telegram Assistant
//!
//! A command-line interface for running the Corvid bot.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use clap::{Args, Parser, Subcommand};
use corvid_bot::error::Result;
use corvid_bot::prelude::*;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Corvid - Personal Telegram assistant backed by the OpenAI Responses API
#[derive(Parser)]
#[command(name = "corvid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and poll for Telegram updates
    Run(RunArgs),

    /// Check configuration and environment without starting the bot
    Check,
}

/// Arguments for the run command
#[derive(Args)]
struct RunArgs {
    /// Model to use (overrides CORVID_MODEL)
    #[arg(short, long)]
    model: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose);

    // Run the async main
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "corvid_bot={level},corvid={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Check => cmd_check(),
    }
}

/// Start the bot.
async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = BotConfig::from_env()?;

    // Override model if specified
    if let Some(model) = args.model {
        config.chat.model = model;
    }

    let mut builder = OpenAiClient::builder()
        .api_key(&config.openai.api_key)
        .max_output_tokens(config.chat.max_output_tokens)
        .timeout_secs(config.chat.request_timeout_secs);
    if let Some(ref base_url) = config.openai.base_url {
        builder = builder.base_url(base_url);
    }
    let model = builder.build();

    let gateway = Gateway::builder().config(config).model(model).build();

    println!("Corvid running. Press Ctrl+C to stop.\n");

    // Run with graceful shutdown
    tokio::select! {
        result = gateway.run() => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            Ok(())
        }
    }
}

/// Check the environment and print a redacted configuration summary.
fn cmd_check() -> Result<()> {
    println!("Corvid Configuration Check\n");

    println!("Environment:");
    print_env_status("TELEGRAM_TOKEN");
    print_env_status("OPENAI_API_KEY");
    print_env_status("OPENAI_BASE_URL");
    print_env_status("CORVID_MODEL");
    print_env_status("CORVID_PERSONA");
    print_env_status("CORVID_ALLOWED_USERS");
    print_env_status("CORVID_HISTORY_LIMIT");
    print_env_status("CORVID_MAX_OUTPUT_TOKENS");
    print_env_status("CORVID_REQUEST_TIMEOUT_SECS");
    println!();

    let config = BotConfig::from_env()?;

    println!("Configuration:");
    for line in config.summary().lines() {
        println!("  {line}");
    }

    Ok(())
}

/// Print environment variable status.
fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() {
        "set"
    } else {
        "-"
    };
    println!("  {name}: {status}");
}
