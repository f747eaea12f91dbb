//! deckagent CLI — terminal front end for the research agent.
//!
//! Provides both single-topic and interactive modes.

mod commands;
mod logging;
mod render;
mod repl;

use clap::Parser;
use deckagent_core::ConfigOverrides;
use std::path::PathBuf;
use std::process::ExitCode;

/// deckagent: research any technical topic and get an executive deck
#[derive(Parser, Debug)]
#[command(name = "deckagent", version, about, long_about = None)]
struct Cli {
    /// Topic to research (starts interactive mode if omitted)
    topic: Option<String>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Characters of research text passed to the synthesis step
    #[arg(long)]
    max_context_chars: Option<usize>,

    /// Workspace directory (searched for .deckagent/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Print the final pipeline state as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default .deckagent/config.toml in the workspace
    Init,
    /// Show the effective configuration
    Show,
    /// Show where configuration files are looked up
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Dropped when `main` returns, which flushes the file log.
    let _guard = logging::init(cli.verbose, cli.quiet);

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if let Some(command) = cli.command {
        commands::handle_command(command, &workspace).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let overrides = ConfigOverrides {
        model: cli.model,
        max_context_chars: cli.max_context_chars,
    };
    let config = deckagent_core::load_config(Some(&workspace), &overrides)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    for warning in config.validate()? {
        tracing::warn!("{}", warning);
    }

    let options = repl::OutputOptions {
        json: cli.json,
        quiet: cli.quiet,
    };

    if let Some(topic) = cli.topic {
        repl::run_single_topic(&topic, config, options).await
    } else {
        repl::run_interactive(config, options).await?;
        Ok(ExitCode::SUCCESS)
    }
}
