//! # fareguard-cli
//!
//! Diagnostic front end over `fareguard-core`. Replays a booking scenario
//! captured from the booking UI and prints the price breakdown, validation
//! result, API reconciliation and audit trail.
//!
//! ```text
//! fareguard check booking.json              # text report
//! fareguard check booking.json --format json
//! fareguard --config ./fareguard.toml config # effective configuration
//! ```

pub mod config;
pub mod error;
pub mod scenario;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use config::{CliConfig, OutputFormat};
pub use error::{CliError, CliResult};
pub use scenario::{replay, Report, Scenario};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "fareguard", version, about = "Booking price reconciliation checks")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "FAREGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay a booking scenario file and report on its price
    Check {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Output format (overrides the config file)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Result of a command, mapped to the process exit code by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Booking is consistent, or nothing was checked.
    Clean,
    /// Booking is invalid or its API price needs review.
    Flagged,
}

// =============================================================================
// Logging
// =============================================================================

/// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
/// Logs go to stderr so JSON reports on stdout stay parseable.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// =============================================================================
// Commands
// =============================================================================

/// Executes a parsed command and writes its output to stdout.
pub fn run(cli: &Cli, config: &CliConfig) -> CliResult<Outcome> {
    match &cli.command {
        Commands::Check { scenario, format } => {
            let format = format.unwrap_or(config.output.format);
            let (rendered, outcome) = check(scenario, config, format)?;
            println!("{}", rendered);
            Ok(outcome)
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(Outcome::Clean)
        }
    }
}

/// Loads, replays and renders a scenario file.
pub fn check(path: &std::path::Path, config: &CliConfig, format: OutputFormat) -> CliResult<(String, Outcome)> {
    info!(?path, "Checking booking scenario");
    let contents = std::fs::read_to_string(path)?;
    let scenario = Scenario::from_json(&contents)?;
    debug!(
        passengers = scenario.passengers.len(),
        services = scenario.selected_services.len(),
        "Scenario loaded"
    );

    let report = replay(&scenario, &config.pricing)?;
    let outcome = if report.is_clean() {
        Outcome::Clean
    } else {
        Outcome::Flagged
    };

    let rendered = match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };

    Ok((rendered, outcome))
}
