// src/commands.rs
//! Command handler for the multibin CLI

use crate::cli::{Cli, OutputFormat};
use anyhow::{Context, Result, bail};
use multibin::{Error, FsStore, Generator, GeneratorConfig, SourceLedger};
use tracing::{error, info, warn};

/// Run one generate or restore pass as described by the command line
pub fn cmd_run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    if let Some(to) = &cli.to
        && to.exists()
        && !to.is_dir()
    {
        return Err(Error::Usage(format!("--to {} is not a directory", to.display())).into());
    }

    let store = FsStore::new();
    let generator = Generator::with_config(&store, config);
    let aggregator = cli.to.as_deref();

    let ledger = if cli.restore {
        generator.restore(aggregator, &cli.dirs)
    } else {
        generator.generate(aggregator, &cli.dirs)
    };

    // Apply failures and per-directory failures are both reported
    let mut failures = Vec::new();
    if cli.apply {
        match ledger.apply(&store) {
            Ok(()) => info!("Wrote {} file change(s)", ledger.filenames().len()),
            Err(e) => {
                error!("Failed to apply changes: {}", e);
                failures.push(format!("Failed to apply changes: {}", e));
            }
        }
    } else {
        print_preview(&ledger, cli.format)?;
    }

    if let Some(e) = ledger.single_error() {
        warn!("Some directories could not be processed");
        failures.push(e.to_string());
    }

    if !failures.is_empty() {
        bail!("{}", failures.join("\n"));
    }
    Ok(())
}

fn print_preview(ledger: &SourceLedger, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", ledger),
        OutputFormat::Json => {
            let json = ledger.to_json().context("Failed to serialize preview")?;
            println!("{}", json);
        }
    }
    Ok(())
}
