//! Medbill CLI
//!
//! Main entry point for the medbill command-line tool.
//! Looks up billing codes for clinical queries and suggests revenue-maximizing
//! code combinations.

mod commands;
mod fallback;
mod output;
mod runtime;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{CombosCommand, OptimizeCommand, RecommendCommand, SearchCommand, StatsCommand};
use medbill_core::{config::AppConfig, logging, AppError};
use runtime::Runtime;
use std::path::PathBuf;
use std::process::ExitCode;

/// Medbill - billing-code lookup and revenue guidance
#[derive(Parser, Debug)]
#[command(name = "medbill")]
#[command(about = "Billing-code lookup and revenue guidance", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MEDBILL_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MEDBILL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider for narratives (ollama, openai)
    #[arg(short, long, global = true, env = "MEDBILL_PROVIDER")]
    provider: Option<String>,

    /// Model identifier for narratives
    #[arg(short, long, global = true, env = "MEDBILL_MODEL")]
    model: Option<String>,

    /// Use the built-in sample catalog if the configured one cannot be loaded
    #[arg(long, global = true)]
    fallback_catalog: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search billing codes for a clinical query
    Search(SearchCommand),

    /// Build a billing plan for an encounter
    Optimize(OptimizeCommand),

    /// Canadian billing recommendation for a query
    Recommend(RecommendCommand),

    /// Add-on codes that can be billed with a code
    Combos(CombosCommand),

    /// Catalog and revenue statistics
    Stats(StatsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Search(_) => "search",
            Commands::Optimize(_) => "optimize",
            Commands::Recommend(_) => "recommend",
            Commands::Combos(_) => "combos",
            Commands::Stats(_) => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let unavailable = e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<AppError>())
                .any(AppError::is_search_unavailable);

            if unavailable {
                eprintln!("Search unavailable: {:#}", e);
                ExitCode::from(2)
            } else {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Medbill CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let runtime = Runtime::new(config, cli.fallback_catalog)?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&runtime).await,
        Commands::Optimize(cmd) => cmd.execute(&runtime).await,
        Commands::Recommend(cmd) => cmd.execute(&runtime).await,
        Commands::Combos(cmd) => cmd.execute(&runtime).await,
        Commands::Stats(cmd) => cmd.execute(&runtime).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
