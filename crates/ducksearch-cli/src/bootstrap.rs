//! Tracing initialization, mirroring `zen-cli::bootstrap::init_tracing`:
//! `DUCKSEARCH_LOG` wins if set, otherwise `--quiet`/`--verbose` pick a
//! default filter.

use tracing_subscriber::EnvFilter;

pub fn init_tracing(quiet: bool, verbose: u8) {
    let filter = EnvFilter::try_from_env("DUCKSEARCH_LOG").unwrap_or_else(|_| {
        let level = if quiet {
            "warn"
        } else {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        EnvFilter::new(format!("ducksearch={level}"))
    });

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
