//! `ducksearch`: CLI entry point. Mirrors `zen-cli`'s bootstrap sequence —
//! parse flags, init tracing, resolve and validate the project root, then
//! dispatch to the requested subcommand.

mod bootstrap;
mod cli;
mod commands;
mod config;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    bootstrap::init_tracing(cli.quiet, cli.verbose);

    let layout = ducksearch_parser::validate_root(&cli.root)?;
    let config = config::load_config(&layout.config_file)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", layout.config_file.display()))?;

    match cli.command {
        Command::Lint => {
            let all_ok = commands::lint::run(&layout.reports_dir);
            if all_ok {
                tracing::info!("all reports passed lint");
                Ok(())
            } else {
                anyhow::bail!("one or more reports failed lint");
            }
        }
        Command::Serve { host, port, workers, dev } => {
            commands::serve::run(cli.root, config, commands::serve::ServeOptions { host, port, workers, dev })
        }
    }
}
