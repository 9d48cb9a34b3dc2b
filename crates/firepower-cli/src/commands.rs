use std::fs;
use std::path::Path as FsPath;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use firepower_diff::{Comparison, DivergenceRecorder};
use firepower_store::StoreConfig;
use firepower_types::{Path, Value};

use crate::cli::*;

/// Dispatch a parsed command line.
pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, cli.verbose, cli.format),
        Command::CheckConfig(args) => cmd_check_config(args, cli.format),
    }
}

#[derive(Debug, Serialize)]
struct DiffReport {
    equal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    divergence: Option<DivergenceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    numeric: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    added: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct DivergenceReport {
    path: String,
    reason: String,
}

fn cmd_diff(args: DiffArgs, verbose: bool, format: OutputFormat) -> anyhow::Result<()> {
    info!(old = %args.old.display(), new = %args.new.display(), field = ?args.field, "comparing documents");

    let mut comparison = Comparison::new(load_side(&args.old)?, load_side(&args.new)?);
    if let Some(field) = &args.field {
        let path = Path::from_dotted(field).with_context(|| format!("invalid --field {field:?}"))?;
        comparison = comparison.at(&path);
    }

    let report = build_report(&comparison, verbose, args.numeric, args.arrays)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report)?,
    }
    Ok(())
}

/// Read a JSON document; a missing file is an absent side.
fn load_side(path: &FsPath) -> anyhow::Result<Option<Value>> {
    if !path.exists() {
        debug!(path = %path.display(), "file not found, treating as absent");
        return Ok(None);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(Some(Value::from(json)))
}

fn build_report(comparison: &Comparison, verbose: bool, numeric: bool, arrays: bool) -> anyhow::Result<DiffReport> {
    let mut recorder = DivergenceRecorder::new();
    let equal = comparison.is_equal_traced(&mut recorder);
    let divergence = match recorder.first {
        Some((path, divergence)) if verbose => Some(DivergenceReport {
            path: path.to_string(),
            reason: divergence.to_string(),
        }),
        _ => None,
    };

    let numeric = if numeric {
        let is_mapping = |v: Option<&Value>| matches!(v, Some(Value::Mapping(_)));
        if is_mapping(comparison.old()) || is_mapping(comparison.new_value()) {
            Some(serde_json::to_value(comparison.object_numerical_diff()?)?)
        } else {
            Some(serde_json::json!(comparison.numerical_diff()?))
        }
    } else {
        None
    };

    let (added, removed) = if arrays {
        (
            Some(to_json_all(comparison.added_array_values()?)?),
            Some(to_json_all(comparison.removed_array_values()?)?),
        )
    } else {
        (None, None)
    };

    Ok(DiffReport {
        equal,
        divergence,
        numeric,
        added,
        removed,
    })
}

fn to_json_all(values: Vec<Value>) -> anyhow::Result<Vec<serde_json::Value>> {
    Ok(values.iter().map(Value::to_json).collect::<Result<_, _>>()?)
}

fn print_report(report: &DiffReport) -> anyhow::Result<()> {
    if report.equal {
        println!("{} Values are equal", "✓".green().bold());
    } else {
        println!("{} Values differ", "✗".red().bold());
    }
    if let Some(d) = &report.divergence {
        println!("  First difference at {}: {}", d.path.cyan(), d.reason);
    }
    if let Some(numeric) = &report.numeric {
        println!("{}", "Numeric diff:".bold());
        println!("{}", serde_json::to_string_pretty(numeric)?);
    }
    if let Some(added) = &report.added {
        println!("{} ({})", "Added:".bold(), added.len());
        for value in added {
            println!("  {} {}", "+".green(), value);
        }
    }
    if let Some(removed) = &report.removed {
        println!("{} ({})", "Removed:".bold(), removed.len());
        for value in removed {
            println!("  {} {}", "-".red(), value);
        }
    }
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = StoreConfig::load(&args.path)
        .with_context(|| format!("invalid store config {}", args.path.display()))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            println!("{} {} is valid", "✓".green().bold(), args.path.display().to_string().bold());
            println!("  log_reads: {}", config.log_reads);
            println!("  log_writes: {}", config.log_writes);
            println!("  slow_operation_threshold_ms: {}", config.slow_operation_threshold_ms);
            println!("  change_channel_capacity: {}", config.change_channel_capacity);
        }
    }
    Ok(())
}
