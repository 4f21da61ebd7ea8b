//! # Post-Submission Reconciliation
//!
//! Decides which total the user sees once the booking API has answered.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TrustPolicy      price shown     needs_review                          │
//! │  ───────────────  ──────────────  ──────────────────────────────────    │
//! │  TrustClient      front end       only if should_investigate            │
//! │  TrustServer      backend         only if should_investigate            │
//! │  FlagForReview    front end       whenever the prices are not equal     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `TrustClient` is the default because it is what the booking flow has
//! always done. Overriding the server's total is a fraud surface, so the
//! choice is a named setting rather than a hidden assumption.

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::validation::{ApiPriceCheck, DivergenceKind};

/// Which side's total wins when the booking API disagrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    #[default]
    #[serde(alias = "client", alias = "frontend")]
    TrustClient,
    #[serde(alias = "server", alias = "backend")]
    TrustServer,
    #[serde(alias = "review")]
    FlagForReview,
}

impl std::fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustPolicy::TrustClient => write!(f, "trust_client"),
            TrustPolicy::TrustServer => write!(f, "trust_server"),
            TrustPolicy::FlagForReview => write!(f, "flag_for_review"),
        }
    }
}

impl std::str::FromStr for TrustPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" | "trust_client" | "frontend" => Ok(TrustPolicy::TrustClient),
            "server" | "trust_server" | "backend" => Ok(TrustPolicy::TrustServer),
            "review" | "flag_for_review" => Ok(TrustPolicy::FlagForReview),
            other => Err(CoreError::InvalidRules(format!(
                "Unknown trust policy: '{}'. Valid options: client, server, review",
                other
            ))),
        }
    }
}

/// Side whose price ended up displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Client,
    Server,
}

/// Final price decision for a submitted booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub displayed_price: Money,
    pub source: PriceSource,
    pub needs_review: bool,
    pub divergence: DivergenceKind,
    pub policy: TrustPolicy,
}

/// Applies `policy` to a classified API price check.
///
/// ```rust
/// use fareguard_core::money::Money;
/// use fareguard_core::reconcile::{reconcile, PriceSource, TrustPolicy};
/// use fareguard_core::validation::PriceValidator;
///
/// let check = PriceValidator::default().validate_api_response_price(
///     Money::new(1_000_000),
///     Money::new(1_060_000),
///     "B1",
///     "VND",
/// );
/// let decision = reconcile(&check, TrustPolicy::TrustServer);
/// assert_eq!(decision.displayed_price, Money::new(1_060_000));
/// assert_eq!(decision.source, PriceSource::Server);
/// assert!(decision.needs_review);
/// ```
pub fn reconcile(check: &ApiPriceCheck, policy: TrustPolicy) -> Reconciliation {
    let record = &check.audit_log;
    let (displayed_price, source, needs_review) = match policy {
        TrustPolicy::TrustClient => (record.frontend_price, PriceSource::Client, check.should_investigate),
        TrustPolicy::TrustServer => (record.api_price, PriceSource::Server, check.should_investigate),
        TrustPolicy::FlagForReview => (record.frontend_price, PriceSource::Client, !check.is_valid),
    };

    if needs_review {
        warn!(
            reference_id = %record.reference_id,
            %policy,
            displayed = displayed_price.amount(),
            frontend = record.frontend_price.amount(),
            api = record.api_price.amount(),
            "Booking price flagged for review"
        );
    }

    Reconciliation {
        displayed_price,
        source,
        needs_review,
        divergence: check.divergence,
        policy,
    }
}
