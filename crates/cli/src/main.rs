//! Coursebrief CLI
//!
//! Main entry point for the coursebrief command-line tool.
//! Turns a directory of recorded lessons and their materials into linked
//! Markdown summaries.

mod commands;

use clap::{Parser, Subcommand};
use commands::{PlanCommand, PromptsCommand, SummarizeCommand};
use coursebrief_core::config::{AppConfig, ConfigOverrides};
use coursebrief_core::{logging, AppResult};
use std::path::{Path, PathBuf};

/// Coursebrief - summarize video courses into Markdown study notes
#[derive(Parser, Debug)]
#[command(name = "coursebrief")]
#[command(about = "Summarize video courses into linked Markdown notes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "COURSEBRIEF_CONFIG")]
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

    /// Generation provider (ollama, openai, mock)
    #[arg(short, long, global = true, env = "COURSEBRIEF_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "COURSEBRIEF_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a course directory
    Summarize(SummarizeCommand),

    /// Show how course files map to lessons
    Plan(PlanCommand),

    /// List prompt definitions
    Prompts(PromptsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Summarize(_) => "summarize",
            Commands::Plan(_) => "plan",
            Commands::Prompts(_) => "prompts",
        }
    }

    fn course_dir(&self) -> Option<&Path> {
        match self {
            Commands::Summarize(cmd) => Some(cmd.course_dir.as_path()),
            Commands::Plan(cmd) => Some(cmd.course_dir.as_path()),
            Commands::Prompts(_) => None,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, then config file, then environment
    let config = AppConfig::load(cli.config.as_deref(), cli.command.course_dir())?;

    let mut overrides = ConfigOverrides {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        log_level: cli.log_level.clone(),
        verbose: cli.verbose,
        no_color: cli.no_color,
        ..ConfigOverrides::default()
    };
    if let Commands::Summarize(cmd) = &cli.command {
        overrides.output_dir = cmd.output.clone();
        overrides.endpoint = cmd.endpoint.clone();
        overrides.describe_images = cmd.describe_images;
        overrides.tracking = cmd.tracking.clone();
        overrides.retry_delay_ms = cmd.retry_delay_ms;
    }
    let config = config.with_overrides(overrides)?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Coursebrief starting");
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);
    if let Some(ref file) = config.config_file {
        tracing::debug!("Config file: {:?}", file);
    }

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // Route to command handlers
    let result = match &cli.command {
        Commands::Summarize(cmd) => cmd.execute(&config).await,
        Commands::Plan(cmd) => cmd.execute().await,
        Commands::Prompts(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
