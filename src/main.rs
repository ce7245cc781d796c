// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod once;
mod server;
mod slurm;

use slurm::{CommandSource, QueueCollector};

#[derive(Parser, Debug)]
#[command(name = "squeue-exporter")]
#[command(about = "Prometheus exporter for the Slurm job queue")]
#[command(version)]
struct Args {
    /// Address to serve /metrics on
    #[arg(long, default_value = "0.0.0.0:9341", env = "SQUEUE_EXPORTER_LISTEN")]
    listen: String,

    /// Path to the squeue binary
    #[arg(long, default_value = "squeue", env = "SQUEUE_EXPORTER_SQUEUE")]
    squeue: String,

    /// Kill squeue and fail the scrape after this many seconds (0 = no limit)
    #[arg(long, default_value = "30", env = "SQUEUE_EXPORTER_TIMEOUT")]
    timeout: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", env = "SQUEUE_EXPORTER_LOG")]
    log_level: String,

    /// Scrape the queue once, print the snapshot as NDJSON and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let source = CommandSource::squeue(args.squeue.clone()).with_timeout(args.timeout());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        squeue = source.program(),
        args = ?source.args(),
        timeout = ?source.timeout(),
        "starting squeue-exporter"
    );
    let collector = QueueCollector::new(source).context("Failed to create queue collector")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    if args.once {
        rt.block_on(once::run_once_mode(&collector))
    } else {
        rt.block_on(server::serve(&args.listen, collector))
    }
}

/// Log to stderr so `--once` output on stdout stays machine-readable
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("squeue_exporter={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
