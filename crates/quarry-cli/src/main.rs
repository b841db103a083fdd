//! # Quarry CLI
//!
//! Command-line interface for the Quarry media library search.
//!
//! ## Commands
//!
//! - `quarry query <terms>` - Search the library once and print the results
//! - `quarry interactive` - Start interactive TUI mode with search-as-you-type
//! - `quarry status` - Show index statistics
//! - `quarry watch <terms>` - Re-run a search whenever the catalog changes
//!
//! ## Example Usage
//!
//! ```bash
//! # Search a catalog for an artist and album at once
//! quarry --catalog ~/Music/library.json query beatles abbey
//!
//! # Interactive search
//! quarry interactive
//! ```

mod app;
mod commands;
mod debounce;
mod render;
mod tui;
mod watcher;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quarry - Live search over a tagged media library
#[derive(Parser)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the record catalog (overrides the configuration)
    #[arg(long, global = true, env = "QUARRY_CATALOG")]
    catalog: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the library for nodes matching every term
    Query {
        /// Search terms (matched case-insensitively as substrings)
        terms: Vec<String>,

        /// Maximum number of results to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Start interactive TUI mode
    #[command(alias = "i")]
    Interactive,

    /// Show index status and statistics
    Status,

    /// Watch the catalog and re-run a search whenever it changes
    Watch {
        /// Search terms to re-run after each rebuild
        terms: Vec<String>,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => quarry_core::Config::load_from(path)?,
        None => quarry_core::Config::load()?,
    };
    if let Some(catalog) = cli.catalog {
        config.general.catalog_path = Some(catalog);
    }

    // Setup logging
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    // the TUI owns the terminal, so logs go to stderr only outside it
    let interactive = matches!(cli.command, Commands::Interactive);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::filter::filter_fn(move |_| !interactive)),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Query {
            terms,
            limit,
            output,
        } => commands::query::run(config, &terms, limit, output),
        Commands::Interactive => tui::run(config),
        Commands::Status => commands::status::run(config),
        Commands::Watch { terms } => commands::watch::run(config, &terms),
    }
}
