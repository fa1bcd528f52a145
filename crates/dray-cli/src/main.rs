//! dray demo/bench entrypoint: runs one of the end-to-end scenarios against
//! an in-process `ThreadCommunicator` group and prints the result.
//!
//! Not part of the distributed-container core itself — this is build/CLI
//! glue, a harness for exercising it.

mod config;
mod scenarios;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Scenario {
    DenseFillSum,
    RemoteWrite,
    IteratorEquality,
    SparseIteration,
    SparseReduction,
    Conformance,
}

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "dray", version, about = "dray distributed container runtime demo/bench")]
struct Args {
    /// Which end-to-end scenario to run.
    #[arg(value_enum)]
    scenario: Scenario,

    /// Number of simulated ranks (overrides `dray.toml`).
    #[arg(long)]
    ranks: Option<usize>,

    /// Optional configuration file path (overrides discovery of `dray.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = config::load_from(args.config)?;
    let ranks = args.ranks.unwrap_or(config.ranks);

    tracing::info!(ranks, scenario = ?args.scenario, "running scenario");

    match args.scenario {
        Scenario::DenseFillSum => scenarios::dense_fill_sum(ranks),
        Scenario::RemoteWrite => scenarios::remote_write(ranks),
        Scenario::IteratorEquality => scenarios::iterator_equality(ranks),
        Scenario::SparseIteration => scenarios::sparse_iteration(ranks),
        Scenario::SparseReduction => scenarios::sparse_reduction(ranks),
        Scenario::Conformance => scenarios::conformance(ranks),
    }
}
