//! # Pricing Rules
//!
//! Every threshold the calculator and validator use, named and overridable.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rule                        Default       Used by                      │
//! │  ──────────────────────────  ────────────  ───────────────────────────  │
//! │  tolerance                   1             every equality check         │
//! │  high_total_warning          50,000,000    "unusually high" warning     │
//! │  low_total_warning           100,000       "unusually low" warning      │
//! │  investigate_abs_threshold   1,000         API divergence escalation    │
//! │  investigate_pct_threshold   5 %           API divergence escalation    │
//! │  fallback_unit_price         50,000        unknown service addon ids    │
//! │  unknown_service             fallback      fallback | reject            │
//! │  trust_policy                client        post-submission price        │
//! │  audit_capacity              10            AuditLogger bound            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The struct is plain data; loading it from a file is the app's job.

use serde::{Deserialize, Serialize};

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::calculator::{UnknownServicePolicy, DEFAULT_FALLBACK_UNIT_PRICE};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, PRICE_TOLERANCE};
use crate::reconcile::TrustPolicy;

/// What to do with a selected service id that the catalog does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownServiceMode {
    /// Charge `fallback_unit_price` per passenger and raise a warning.
    #[default]
    Fallback,
    /// Refuse to price the selection.
    Reject,
}

impl std::str::FromStr for UnknownServiceMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fallback" => Ok(UnknownServiceMode::Fallback),
            "reject" => Ok(UnknownServiceMode::Reject),
            other => Err(CoreError::InvalidRules(format!(
                "Unknown service mode: '{}'. Valid options: fallback, reject",
                other
            ))),
        }
    }
}

/// Thresholds and policies for one booking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRules {
    #[serde(default = "default_tolerance")]
    pub tolerance: Money,

    #[serde(default = "default_high_total_warning")]
    pub high_total_warning: Money,

    #[serde(default = "default_low_total_warning")]
    pub low_total_warning: Money,

    /// Absolute API divergence above which a booking is escalated.
    #[serde(default = "default_investigate_abs_threshold")]
    pub investigate_abs_threshold: Money,

    /// Relative API divergence (percent of the front-end price) above which
    /// a booking is escalated.
    #[serde(default = "default_investigate_pct_threshold")]
    pub investigate_pct_threshold: f64,

    #[serde(default = "default_fallback_unit_price")]
    pub fallback_unit_price: Money,

    #[serde(default)]
    pub unknown_service: UnknownServiceMode,

    #[serde(default)]
    pub trust_policy: TrustPolicy,

    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

fn default_tolerance() -> Money {
    PRICE_TOLERANCE
}

fn default_high_total_warning() -> Money {
    Money::new(50_000_000)
}

fn default_low_total_warning() -> Money {
    Money::new(100_000)
}

fn default_investigate_abs_threshold() -> Money {
    Money::new(1_000)
}

fn default_investigate_pct_threshold() -> f64 {
    5.0
}

fn default_fallback_unit_price() -> Money {
    DEFAULT_FALLBACK_UNIT_PRICE
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

impl Default for PricingRules {
    fn default() -> Self {
        PricingRules {
            tolerance: default_tolerance(),
            high_total_warning: default_high_total_warning(),
            low_total_warning: default_low_total_warning(),
            investigate_abs_threshold: default_investigate_abs_threshold(),
            investigate_pct_threshold: default_investigate_pct_threshold(),
            fallback_unit_price: default_fallback_unit_price(),
            unknown_service: UnknownServiceMode::default(),
            trust_policy: TrustPolicy::default(),
            audit_capacity: default_audit_capacity(),
        }
    }
}

impl PricingRules {
    /// The calculator policy these rules describe.
    pub fn unknown_service_policy(&self) -> UnknownServicePolicy {
        match self.unknown_service {
            UnknownServiceMode::Fallback => UnknownServicePolicy::Fallback(self.fallback_unit_price),
            UnknownServiceMode::Reject => UnknownServicePolicy::Reject,
        }
    }

    /// Checks the rules for internal consistency.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tolerance.is_negative() {
            return Err(CoreError::InvalidRules(
                "tolerance cannot be negative".into(),
            ));
        }

        if self.low_total_warning >= self.high_total_warning {
            return Err(CoreError::InvalidRules(format!(
                "low_total_warning ({}) must be below high_total_warning ({})",
                self.low_total_warning, self.high_total_warning
            )));
        }

        if self.investigate_abs_threshold.is_negative() {
            return Err(CoreError::InvalidRules(
                "investigate_abs_threshold cannot be negative".into(),
            ));
        }

        if !self.investigate_pct_threshold.is_finite() || self.investigate_pct_threshold < 0.0 {
            return Err(CoreError::InvalidRules(
                "investigate_pct_threshold must be a non-negative number".into(),
            ));
        }

        if self.fallback_unit_price.is_negative() {
            return Err(CoreError::InvalidRules(
                "fallback_unit_price cannot be negative".into(),
            ));
        }

        if self.audit_capacity == 0 {
            return Err(CoreError::InvalidRules(
                "audit_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = PricingRules::default();
        assert_eq!(rules.tolerance, Money::new(1));
        assert_eq!(rules.audit_capacity, 10);
        assert_eq!(rules.trust_policy, TrustPolicy::TrustClient);
        assert_eq!(
            rules.unknown_service_policy(),
            UnknownServicePolicy::Fallback(Money::new(50_000))
        );
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_rules() {
        let mut rules = PricingRules::default();
        rules.audit_capacity = 0;
        assert!(rules.validate().is_err());

        let mut rules = PricingRules::default();
        rules.low_total_warning = rules.high_total_warning;
        assert!(rules.validate().is_err());

        let mut rules = PricingRules::default();
        rules.tolerance = Money::new(-1);
        assert!(rules.validate().is_err());

        let mut rules = PricingRules::default();
        rules.investigate_pct_threshold = f64::NAN;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_reject_mode() {
        let rules = PricingRules {
            unknown_service: UnknownServiceMode::Reject,
            ..PricingRules::default()
        };
        assert_eq!(rules.unknown_service_policy(), UnknownServicePolicy::Reject);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let rules: PricingRules =
            serde_json::from_str(r#"{ "tolerance": 5, "trust_policy": "flag_for_review" }"#).unwrap();
        assert_eq!(rules.tolerance, Money::new(5));
        assert_eq!(rules.trust_policy, TrustPolicy::FlagForReview);
        assert_eq!(rules.low_total_warning, Money::new(100_000));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Reject".parse::<UnknownServiceMode>().unwrap(), UnknownServiceMode::Reject);
        assert!("ignore".parse::<UnknownServiceMode>().is_err());
    }
}
