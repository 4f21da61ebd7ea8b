//! # CLI Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     FAREGUARD_TRUST_POLICY=review                                       │
//! │     FAREGUARD_TOLERANCE=1                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     --config <path>, or                                                 │
//! │     ~/.config/fareguard/fareguard.toml (Linux)                          │
//! │     ~/Library/Application Support/com.fareguard.fareguard/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! tolerance = 1
//! high_total_warning = 50000000
//! low_total_warning = 100000
//! investigate_abs_threshold = 1000
//! investigate_pct_threshold = 5.0
//! fallback_unit_price = 50000
//! unknown_service = "fallback"   # fallback | reject
//! trust_policy = "trust_client"  # trust_client | trust_server | flag_for_review (or client | server | review)
//! audit_capacity = 10
//!
//! [logging]
//! filter = "info,fareguard=debug"
//!
//! [output]
//! format = "text"                # text | json
//! ```

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fareguard_core::{Money, PricingRules};

use crate::error::{CliError, CliResult};

// =============================================================================
// Output Format
// =============================================================================

/// How reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable summary followed by the audit trail.
    #[default]
    Text,
    /// One JSON document on stdout.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliError::InvalidConfig(format!(
                "Unknown output format: '{}'. Valid options: text, json",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,fareguard=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub pricing: PricingRules,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

impl CliConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, else the platform config dir)
    /// 3. Environment variables
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file.
    pub fn from_file(path: &Path) -> CliResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> CliResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> CliResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CliResult<()> {
        self.pricing.validate()?;

        if self.logging.filter.trim().is_empty() {
            return Err(CliError::InvalidConfig("logging.filter cannot be empty".into()));
        }

        Ok(())
    }

    /// Applies `FAREGUARD_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("FAREGUARD_TOLERANCE") {
            match value.parse::<i64>() {
                Ok(v) => self.pricing.tolerance = Money::new(v),
                Err(_) => warn!(%value, "Ignoring invalid FAREGUARD_TOLERANCE"),
            }
        }

        if let Some(value) = lookup("FAREGUARD_FALLBACK_PRICE") {
            match value.parse::<i64>() {
                Ok(v) => self.pricing.fallback_unit_price = Money::new(v),
                Err(_) => warn!(%value, "Ignoring invalid FAREGUARD_FALLBACK_PRICE"),
            }
        }

        if let Some(value) = lookup("FAREGUARD_UNKNOWN_SERVICE") {
            match value.parse() {
                Ok(mode) => self.pricing.unknown_service = mode,
                Err(e) => warn!(%value, error = %e, "Ignoring invalid FAREGUARD_UNKNOWN_SERVICE"),
            }
        }

        if let Some(value) = lookup("FAREGUARD_TRUST_POLICY") {
            match value.parse() {
                Ok(policy) => {
                    debug!(%value, "Overriding trust policy from environment");
                    self.pricing.trust_policy = policy;
                }
                Err(e) => warn!(%value, error = %e, "Ignoring invalid FAREGUARD_TRUST_POLICY"),
            }
        }

        if let Some(value) = lookup("FAREGUARD_AUDIT_CAPACITY") {
            match value.parse::<usize>() {
                Ok(v) => self.pricing.audit_capacity = v,
                Err(_) => warn!(%value, "Ignoring invalid FAREGUARD_AUDIT_CAPACITY"),
            }
        }

        if let Some(value) = lookup("FAREGUARD_LOG") {
            self.logging.filter = value;
        }

        if let Some(value) = lookup("FAREGUARD_FORMAT") {
            match value.parse() {
                Ok(format) => self.output.format = format,
                Err(e) => warn!(%value, error = %e, "Ignoring invalid FAREGUARD_FORMAT"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "fareguard", "fareguard")
            .map(|dirs| dirs.config_dir().join("fareguard.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fareguard_core::rules::UnknownServiceMode;
    use fareguard_core::TrustPolicy;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.pricing, PricingRules::default());
        assert_eq!(config.logging.filter, "info,fareguard=debug");
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = CliConfig::from_toml(
            r#"
            [pricing]
            trust_policy = "flag_for_review"
            unknown_service = "reject"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.pricing.trust_policy, TrustPolicy::FlagForReview);
        assert_eq!(config.pricing.unknown_service, UnknownServiceMode::Reject);
        assert_eq!(config.pricing.tolerance, Money::new(1));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_toml_accepts_short_policy_names() {
        let config = CliConfig::from_toml("[pricing]\ntrust_policy = \"client\"\n").unwrap();
        assert_eq!(config.pricing.trust_policy, TrustPolicy::TrustClient);

        let config = CliConfig::from_toml("[pricing]\ntrust_policy = \"review\"\n").unwrap();
        assert_eq!(config.pricing.trust_policy, TrustPolicy::FlagForReview);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CliConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[pricing]"));
        assert_eq!(CliConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CliConfig::default();
        config.apply_overrides(lookup(&[
            ("FAREGUARD_TOLERANCE", "5"),
            ("FAREGUARD_TRUST_POLICY", "server"),
            ("FAREGUARD_UNKNOWN_SERVICE", "reject"),
            ("FAREGUARD_AUDIT_CAPACITY", "25"),
            ("FAREGUARD_FORMAT", "json"),
        ]));
        assert_eq!(config.pricing.tolerance, Money::new(5));
        assert_eq!(config.pricing.trust_policy, TrustPolicy::TrustServer);
        assert_eq!(config.pricing.unknown_service, UnknownServiceMode::Reject);
        assert_eq!(config.pricing.audit_capacity, 25);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = CliConfig::default();
        config.apply_overrides(lookup(&[
            ("FAREGUARD_TOLERANCE", "one"),
            ("FAREGUARD_TRUST_POLICY", "nobody"),
        ]));
        assert_eq!(config.pricing.tolerance, Money::new(1));
        assert_eq!(config.pricing.trust_policy, TrustPolicy::TrustClient);
    }

    #[test]
    fn test_validation() {
        let mut config = CliConfig::default();
        config.pricing.audit_capacity = 0;
        assert!(matches!(config.validate(), Err(CliError::Core(_))));

        let mut config = CliConfig::default();
        config.logging.filter = "  ".to_string();
        assert!(matches!(config.validate(), Err(CliError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let missing = Path::new("/definitely/not/here/fareguard.toml");
        assert!(matches!(CliConfig::load(Some(missing)), Err(CliError::Io(_))));
    }
}
