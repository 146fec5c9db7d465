//! Foreground monitoring command implementation.
//!
//! Editors provision this as a background shell task (`codecarbon monitor`)
//! to track a whole workspace session without going through the LSP server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use codecarbon_lsp_core::format_emissions;
use codecarbon_tracker::{EmissionsTracker, TrackerConfig, read_emissions};

/// Track emissions in the foreground until Ctrl-C, then report the session
/// estimate and the running total recorded in the emissions CSV.
pub fn execute(output_dir: Option<PathBuf>, output_file: String) -> Result<()> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    let mut config = TrackerConfig::new(output_dir);
    config.output_file = output_file;

    let mut tracker =
        EmissionsTracker::new(config).context("cannot initialize emissions tracker")?;

    let runtime = tokio::runtime::Runtime::new()?;

    tracker.start();
    tracing::info!("Emissions tracking started. Press Ctrl-C to stop.");

    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("cannot listen for Ctrl-C")?;

    let emissions = tracker.stop().context("cannot stop emissions tracker")?;
    println!("Session emissions: {}", format_emissions(emissions, 2));

    let recorded = read_emissions(&tracker.output_path())?;
    let total: f64 = recorded.iter().sum();
    println!(
        "Recorded total over {} session(s): {} ({})",
        recorded.len(),
        format_emissions(total, 2),
        tracker.output_path().display()
    );

    Ok(())
}
