//! CodeCarbon CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "codecarbon")]
#[command(version)]
#[command(about = "Track the carbon emissions of your development sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server over stdio
    Lsp,

    /// Track emissions in the foreground until interrupted
    Monitor {
        /// Directory the emissions CSV is written to (defaults to the current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// File name of the emissions CSV
        #[arg(long, default_value = codecarbon_tracker::OUTPUT_EMISSIONS_FILE)]
        output_file: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging. Diagnostics go to stderr: stdout carries the LSP
    // protocol when running as a language server.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codecarbon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lsp => commands::lsp::execute(),
        Commands::Monitor {
            output_dir,
            output_file,
        } => commands::monitor::execute(output_dir, output_file),
    }
}
