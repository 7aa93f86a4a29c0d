//! `fsloadgen` - closed-loop load generator and latency profiler for online
//! feature-retrieval services.
//!
//! The only real command is `run`: it builds a request corpus from a
//! template and an entity listing, drives it at a target QPS against a
//! pluggable [`fsloadgen_caller::Caller`], and prints aggregate latency
//! statistics. If an output location is configured, detailed per-request
//! results are also written and loaded into a table sink.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Closed-loop load generator for online feature-retrieval services.
#[derive(Parser)]
#[command(name = "fsloadgen")]
#[command(about = "Closed-loop load generator for online feature-retrieval services")]
#[command(version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a load-generation experiment.
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
    }
}
