//! CLI entry point for the earliest tool.

use anyhow::{Context, Result};
use clap::Parser;
use earliest_core::HuntConfig;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = HuntConfig::default()
        .with_marker(args.marker_byte())
        .with_chunk_size(args.chunk_size)
        .with_failure_policy(args.on_error.into());

    info!(
        url = %args.url,
        dst = %args.dst.display(),
        marker = %args.marker.escape_default(),
        chunk_size = config.chunk_size,
        "Earliest starting"
    );

    let report = earliest_core::run(&args.url, &args.dst, &config)
        .await
        .with_context(|| format!("marker hunt over {} failed", args.url))?;

    match report.earliest {
        Some(offset) => info!(
            offset,
            kept = ?report.kept,
            removed = report.removed.len(),
            cancelled = report.cancelled,
            failed = report.failed,
            "Hunt complete"
        ),
        None => info!(
            removed = report.removed.len(),
            failed = report.failed,
            "Hunt complete: no file contains the marker"
        ),
    }

    Ok(())
}
