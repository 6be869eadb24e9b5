//! # tiledoc CLI
//!
//! Command-line interface for the tiledoc reference page and header
//! generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tiledoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "tiledoc.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render pages, table of contents and header into the output directory
    Build {
        /// Print a JSON summary of the written files
        #[arg(long)]
        json: bool,
    },

    /// Validate records and render in memory without writing anything
    Check {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List topics in documentation order
    Topics,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build { json } => commands::build_docs(&cli.config, json),
        Commands::Check { json } => commands::check_records(&cli.config, json),
        Commands::Topics => commands::list_topics(&cli.config),
    }
}
