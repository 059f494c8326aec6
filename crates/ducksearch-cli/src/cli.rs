//! Command-line surface (spec §6): global flags shared by every
//! subcommand, plus `serve` and `lint`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ducksearch", about = "Parameterized analytical report engine atop embedded DuckDB")]
pub struct Cli {
    /// Project root: must contain `config.toml`, `reports/`, `composites/`, `cache/`.
    #[arg(long, global = true)]
    pub root: PathBuf,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server exposing `/health` and `/report`.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8765)]
        port: u16,

        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Disable cache freshness checks; always recompute.
        #[arg(long)]
        dev: bool,
    },
    /// Parse and lint every `.sql` report under `reports/`.
    Lint,
}
