//! redeploy: delete and recreate one Deployment + Service pair.
//!
//! # Usage
//!
//! ```text
//! redeploy reconcile [--config F] [-n NS] [--deployment F] [--service F] [--timeout SECS] [--json]
//! redeploy list [-n NS] [--json]
//! redeploy status [--config F] [-n NS] [--deployment F] [--service F] [--json]
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{list::ListArgs, reconcile::ReconcileArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "redeploy",
    version,
    about = "Reconcile a Deployment + Service pair against its manifests",
    long_about = None,
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List, delete, recreate from manifests, and list again.
    Reconcile(ReconcileArgs),

    /// List deployments and services in a namespace.
    List(ListArgs),

    /// Show whether the workload's deployment and service exist.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(async {
        match cli.command {
            Commands::Reconcile(args) => args.run().await,
            Commands::List(args) => args.run().await,
            Commands::Status(args) => args.run().await,
        }
    })
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
