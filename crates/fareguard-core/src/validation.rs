//! # Validation Module
//!
//! Consistency checks on booking prices, plus input-shape validators.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where prices get checked                           │
//! │                                                                         │
//! │  Addon step / submit                                                    │
//! │  └── validate_price_calculation()                                       │
//! │      ├── errors:   negative sub-totals, calculated ≠ expected           │
//! │      └── warnings: unusually high/low, fare tables disagree             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Booking API returns its own total                                      │
//! │  └── validate_api_response_price()                                      │
//! │      ├── is_valid:           |diff| ≤ tolerance                         │
//! │      └── should_investigate: diff > 1,000 or > 5 %                      │
//! │                                                                         │
//! │  Business rule violations are COLLECTED, never returned as Err.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::calculator::expected_selection_price;
use crate::error::ValidationError;
use crate::money::Money;
use crate::rules::PricingRules;
use crate::types::{BookingSelection, PartySize, Passenger, PriceAuditEntry, ValidationResult};

/// Result type for input validators.
pub type InputResult<T> = Result<T, ValidationError>;

/// Maximum seats bookable in one reservation.
pub const MAX_PARTY_SEATS: u32 = 9;

// =============================================================================
// Price Comparison
// =============================================================================

/// Symmetric comparison of two prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    pub is_equal: bool,
    pub difference: Money,
    /// Difference as a percentage of the first price (0 when it is zero).
    pub percentage_diff: f64,
}

/// Compares `a` with `b` under `tolerance`.
///
/// ```rust
/// use fareguard_core::money::{Money, PRICE_TOLERANCE};
/// use fareguard_core::validation::compare_prices;
///
/// let cmp = compare_prices(Money::new(200_000), Money::new(210_000), PRICE_TOLERANCE);
/// assert!(!cmp.is_equal);
/// assert_eq!(cmp.difference, Money::new(10_000));
/// assert_eq!(cmp.percentage_diff, 5.0);
/// ```
pub fn compare_prices(a: Money, b: Money, tolerance: Money) -> PriceComparison {
    let difference = a.abs_diff(b);
    PriceComparison {
        is_equal: difference <= tolerance,
        difference,
        percentage_diff: difference.percentage_of(a),
    }
}

// =============================================================================
// API Response Check
// =============================================================================

/// Direction of a front-end vs backend price divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    Match,
    BackendHigher,
    BackendLower,
}

impl DivergenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DivergenceKind::Match => "match",
            DivergenceKind::BackendHigher => "backend_higher",
            DivergenceKind::BackendLower => "backend_lower",
        }
    }
}

impl std::fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one front-end vs backend comparison, for logs and bug reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiAuditRecord {
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub reference_id: String,
    pub currency: String,
    pub frontend_price: Money,
    pub api_price: Money,
    pub difference: Money,
    pub percentage_diff: f64,
    pub divergence: DivergenceKind,
    pub should_investigate: bool,
}

/// Classification of a backend-returned total.
///
/// Classification only: nothing here decides which price wins. See
/// [`crate::reconcile`] for that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiPriceCheck {
    pub is_valid: bool,
    pub should_investigate: bool,
    pub divergence: DivergenceKind,
    pub comparison: PriceComparison,
    pub audit_log: ApiAuditRecord,
}

// =============================================================================
// Price Validator
// =============================================================================

/// Stateless price checker; every call is independent.
#[derive(Debug, Clone, Default)]
pub struct PriceValidator {
    rules: PricingRules,
}

impl PriceValidator {
    pub fn new(rules: PricingRules) -> Self {
        PriceValidator { rules }
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// Checks a calculated total against the total the caller expects.
    ///
    /// Always returns a populated result. Structural problems go to
    /// `errors` and make the result invalid; heuristics go to `warnings`.
    ///
    /// ```rust
    /// use fareguard_core::money::Money;
    /// use fareguard_core::types::{BookingSelection, Passenger, PassengerType, TripType};
    /// use fareguard_core::validation::PriceValidator;
    ///
    /// let validator = PriceValidator::default();
    /// let selection = BookingSelection::new(Money::new(1_256_000), "VND", TripType::OneWay);
    /// let passengers = vec![Passenger::new("adult-1", PassengerType::Adult)];
    ///
    /// let result = validator.validate_price_calculation(
    ///     &selection,
    ///     &passengers,
    ///     Money::zero(),
    ///     Money::zero(),
    ///     Money::new(1_256_000),
    ///     "review",
    /// );
    /// assert!(result.is_valid);
    /// assert_eq!(result.calculated_total, Money::new(1_256_000));
    /// ```
    pub fn validate_price_calculation(
        &self,
        selection: &BookingSelection,
        passengers: &[Passenger],
        baggage_total: Money,
        services_total: Money,
        expected_total: Money,
        step: &str,
    ) -> ValidationResult {
        let rules = &self.rules;
        let addons_total = baggage_total + services_total;
        let calculated_total = selection.total_price + addons_total;

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if selection.total_price.is_negative() {
            errors.push(format!(
                "Selection price cannot be negative: {}",
                selection.total_price
            ));
        }
        if baggage_total.is_negative() {
            errors.push(format!("Baggage total cannot be negative: {}", baggage_total));
        }
        if services_total.is_negative() {
            errors.push(format!("Services total cannot be negative: {}", services_total));
        }

        let difference = calculated_total.abs_diff(expected_total);
        if difference > rules.tolerance {
            errors.push(format!(
                "Price mismatch: calculated {} vs expected {} (difference {})",
                calculated_total, expected_total, difference
            ));
        }

        if calculated_total > rules.high_total_warning {
            warnings.push(format!(
                "Total price {} {} is unusually high (above {})",
                calculated_total, selection.currency, rules.high_total_warning
            ));
        }
        if calculated_total < rules.low_total_warning {
            warnings.push(format!(
                "Total price {} {} is unusually low (below {})",
                calculated_total, selection.currency, rules.low_total_warning
            ));
        }

        if let Some(fare_sum) = expected_selection_price(selection, passengers) {
            if !selection.total_price.within_tolerance(fare_sum, rules.tolerance) {
                warnings.push(format!(
                    "Selection price {} differs from per-passenger fare sum {} (difference {})",
                    selection.total_price,
                    fare_sum,
                    selection.total_price.abs_diff(fare_sum)
                ));
            }
        }

        let is_valid = errors.is_empty();
        if is_valid {
            debug!(step, total = calculated_total.amount(), warnings = warnings.len(), "Price validated");
        } else {
            warn!(step, total = calculated_total.amount(), ?errors, "Price validation failed");
        }

        ValidationResult {
            is_valid,
            calculated_total,
            errors,
            warnings,
            audit_trail: PriceAuditEntry::capture(
                step,
                selection,
                passengers.len(),
                baggage_total,
                services_total,
            )
            .with_detail("expected_total", expected_total.amount()),
        }
    }

    /// Classifies the total returned by the booking API against the
    /// front-end total.
    ///
    /// ```rust
    /// use fareguard_core::money::Money;
    /// use fareguard_core::validation::{DivergenceKind, PriceValidator};
    ///
    /// let check = PriceValidator::default().validate_api_response_price(
    ///     Money::new(1_000_000),
    ///     Money::new(1_060_000),
    ///     "B1",
    ///     "VND",
    /// );
    /// assert!(check.should_investigate);
    /// assert_eq!(check.divergence, DivergenceKind::BackendHigher);
    /// ```
    pub fn validate_api_response_price(
        &self,
        frontend_price: Money,
        api_price: Money,
        reference_id: &str,
        currency: &str,
    ) -> ApiPriceCheck {
        let rules = &self.rules;
        let comparison = compare_prices(frontend_price, api_price, rules.tolerance);

        let divergence = if comparison.is_equal {
            DivergenceKind::Match
        } else if api_price > frontend_price {
            DivergenceKind::BackendHigher
        } else {
            DivergenceKind::BackendLower
        };

        let should_investigate = comparison.difference > rules.investigate_abs_threshold
            || comparison.percentage_diff > rules.investigate_pct_threshold;

        if should_investigate {
            warn!(
                reference_id,
                frontend = frontend_price.amount(),
                api = api_price.amount(),
                difference = comparison.difference.amount(),
                percentage = comparison.percentage_diff,
                %divergence,
                "Backend price diverges, investigation needed"
            );
        } else if !comparison.is_equal {
            info!(
                reference_id,
                difference = comparison.difference.amount(),
                %divergence,
                "Backend price differs within noise"
            );
        } else {
            debug!(reference_id, "Backend price matches");
        }

        ApiPriceCheck {
            is_valid: comparison.is_equal,
            should_investigate,
            divergence,
            comparison,
            audit_log: ApiAuditRecord {
                timestamp: Utc::now(),
                reference_id: reference_id.to_string(),
                currency: currency.to_string(),
                frontend_price,
                api_price,
                difference: comparison.difference,
                percentage_diff: comparison.percentage_diff,
                divergence,
                should_investigate,
            },
        }
    }
}

// =============================================================================
// Input Validators
// =============================================================================

/// Validates the head counts chosen on the search form.
///
/// ## Rules
/// - At least one adult
/// - No more infants than adults (each infant travels on an adult's lap)
/// - At most `MAX_PARTY_SEATS` seated passengers (adults + children)
///
/// ```rust
/// use fareguard_core::types::PartySize;
/// use fareguard_core::validation::validate_party_size;
///
/// assert!(validate_party_size(&PartySize::new(2, 1, 1)).is_ok());
/// assert!(validate_party_size(&PartySize::new(0, 1, 0)).is_err());
/// assert!(validate_party_size(&PartySize::new(1, 0, 2)).is_err());
/// ```
pub fn validate_party_size(party: &PartySize) -> InputResult<()> {
    let seats = party.adults.saturating_add(party.children);

    if party.adults == 0 {
        return Err(ValidationError::OutOfRange {
            field: "adults".to_string(),
            min: 1,
            max: MAX_PARTY_SEATS as i64,
        });
    }

    if seats > MAX_PARTY_SEATS {
        return Err(ValidationError::OutOfRange {
            field: "seated passengers".to_string(),
            min: 1,
            max: MAX_PARTY_SEATS as i64,
        });
    }

    if party.infants > party.adults {
        return Err(ValidationError::OutOfRange {
            field: "infants".to_string(),
            min: 0,
            max: party.adults as i64,
        });
    }

    Ok(())
}

/// Validates an ISO 4217 currency code.
///
/// ## Rules
/// - Must not be empty
/// - Exactly three upper-case ASCII letters
pub fn validate_currency(code: &str) -> InputResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a three-letter upper-case ISO 4217 code".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
