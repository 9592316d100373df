// src/cli.rs
//! CLI definitions for multibin
//!
//! The actual work happens in the `commands` module.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multibin")]
#[command(version)]
#[command(about = "Fold standalone Rust programs into one multi-call binary", long_about = None)]
pub struct Cli {
    /// Program directories, each holding one entry file
    #[arg(required = true, value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Directory that receives the aggregator main.rs
    #[arg(long, value_name = "DIR")]
    pub to: Option<PathBuf>,

    /// Write the changes instead of printing them
    #[arg(long)]
    pub apply: bool,

    /// Undo a previous generate run
    #[arg(long)]
    pub restore: bool,

    /// Preview format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Generator configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
