//! fsanalyzer: directory listings and recursive directory statistics.
//!
//! Thin binary entry point. All logic lives in the `fsanalyzer-core` crate;
//! this file only parses arguments, starts the gateway and prints results.

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use fsanalyzer_core::model::size::format_count;
use fsanalyzer_core::model::{FileRecord, ListingSummary};
use fsanalyzer_core::{platform, GatewayConfig, ScanGateway};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "fsanalyzer", version, about = "Browse directories and measure what they hold")]
struct Cli {
    /// JSON file with `workers` and `grace_period_secs`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (default: one per logical CPU).
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Seconds to wait for running scans on shutdown.
    #[arg(long, global = true)]
    grace_secs: Option<u64>,

    /// -v for debug output, -vv for per-entry tracing.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the immediate children of a directory.
    List(ListArgs),
    /// Recursive size, file and folder counts for one or more directories.
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    path: PathBuf,

    /// Directories first, then by name.
    #[arg(long)]
    sort: bool,

    #[arg(long, conflicts_with = "csv")]
    json: bool,

    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Args)]
struct StatsArgs {
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&cli)?;
    platform::log_system_info(&config);

    let gateway = ScanGateway::new(config).context("failed to start scan gateway")?;
    let result = match &cli.command {
        Command::List(args) => run_list(&gateway, args),
        Command::Stats(args) => run_stats(&gateway, args),
    };
    gateway.shutdown();
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_json_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = cli.grace_secs {
        config = config.with_grace_period(Duration::from_secs(secs));
    }
    config.validate()?;
    Ok(config)
}

fn run_list(gateway: &ScanGateway, args: &ListArgs) -> anyhow::Result<()> {
    let mut records = gateway
        .list_directory_async(&args.path)?
        .wait()
        .with_context(|| format!("cannot list {}", args.path.display()))?;

    if args.sort {
        records.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
    }

    if args.json {
        serde_json::to_writer_pretty(io::stdout().lock(), &records)?;
        println!();
    } else if args.csv {
        let mut writer = csv::Writer::from_writer(io::stdout().lock());
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    } else {
        for record in &records {
            println!("{}", format_record(record));
        }
        println!("{}", ListingSummary::from_records(&records));
    }
    Ok(())
}

fn run_stats(gateway: &ScanGateway, args: &StatsArgs) -> anyhow::Result<()> {
    let (tx, rx) = crossbeam_channel::unbounded();

    for path in &args.paths {
        let tx = tx.clone();
        let path = path.clone();
        gateway
            .get_directory_stats_async(&path)?
            .then(move |result| {
                let _ = tx.send((path, result));
            });
    }
    drop(tx);

    let mut failures = 0usize;
    // Printed in completion order.
    for (path, result) in rx.iter() {
        match result {
            Ok(stats) if args.json => {
                let line = serde_json::json!({ "path": path, "stats": stats });
                println!("{line}");
            }
            Ok(stats) => println!(
                "{}: {} folders, {} files, {}",
                path.display(),
                format_count(stats.directory_count),
                format_count(stats.file_count),
                stats.formatted_size()
            ),
            Err(err) => {
                failures += 1;
                eprintln!("{}: {err}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} directories could not be scanned", args.paths.len());
    }
    Ok(())
}

fn format_record(record: &FileRecord) -> String {
    let modified = record
        .modified_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let size = if record.is_directory {
        "-".to_string()
    } else {
        record.formatted_size()
    };
    format!(
        "{:<5} {:>10}  {:<12} {}  {:<6} {}",
        record.kind.label(),
        size,
        record.owner,
        modified,
        record.extension.as_deref().unwrap_or(""),
        record.name
    )
}
