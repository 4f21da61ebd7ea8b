//! # fareguard
//!
//! Exit codes: 0 when the booking is clean, 2 when it is invalid or needs
//! review, 1 when the check could not run.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use fareguard_cli::{init_tracing, run, Cli, CliConfig, Outcome};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Subscriber is not up yet.
            eprintln!("fareguard: {}", e);
            return ExitCode::from(1);
        }
    };

    init_tracing(&config.logging.filter);

    match run(&cli, &config) {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Flagged) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "Check failed");
            eprintln!("fareguard: {}", e);
            ExitCode::from(1)
        }
    }
}
