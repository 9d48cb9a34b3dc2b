use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "firepower",
    about = "Firepower: structural comparison of JSON documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two JSON documents
    Diff(DiffArgs),
    /// Validate a store configuration file
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Old document (a missing file is treated as absent)
    pub old: PathBuf,
    /// New document (a missing file is treated as absent)
    pub new: PathBuf,
    /// Compare only this dotted field of both documents
    #[arg(long)]
    pub field: Option<String>,
    /// Show numeric differences
    #[arg(long)]
    pub numeric: bool,
    /// Show added and removed array values
    #[arg(long)]
    pub arrays: bool,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    /// Path to a TOML store configuration
    pub path: PathBuf,
}
