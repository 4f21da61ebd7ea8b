//! # CLI Error Type
//!
//! Everything that can stop the diagnostic tool before it prints a report.
//! A booking that fails validation is NOT an error; it is a report with
//! `is_valid = false`.

use thiserror::Error;

use fareguard_core::CoreError;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Scenario or config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Effective config could not be rendered.
    #[error("Failed to render config: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    /// Scenario file is not valid JSON, or the report could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pricing core refused the input.
    #[error(transparent)]
    Core(#[from] CoreError),
}
