//! # Price Calculator
//!
//! Pure derivation of baggage, service and grand totals.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where the grand total comes from                     │
//! │                                                                         │
//! │  BookingSelection.total_price ───────────────────────┐                  │
//! │                                                      │                  │
//! │  Passenger[].extra_baggage.price ─► baggage_total ───┼─► grand total    │
//! │                                                      │                  │
//! │  selected ids × catalog × count ─► services_total ───┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use fareguard_core::calculator::{
//!     compute_baggage_total, compute_grand_total, compute_services_total, UnknownServicePolicy,
//! };
//! use fareguard_core::catalog::{ServiceAddon, ServiceCatalog};
//! use fareguard_core::money::Money;
//! use fareguard_core::types::{Passenger, PassengerType};
//!
//! let catalog = ServiceCatalog::new(vec![
//!     ServiceAddon::new("insurance", "Travel insurance", Money::new(150_000)),
//!     ServiceAddon::new("checkin", "Priority check-in", Money::new(100_000)),
//! ])
//! .unwrap();
//! let passengers =
//!     vec![Passenger::new("adult-1", PassengerType::Adult).with_baggage(15, Money::new(260_000))];
//!
//! let baggage = compute_baggage_total(&passengers);
//! let services = compute_services_total(
//!     ["insurance", "checkin"],
//!     &catalog,
//!     passengers.len(),
//!     UnknownServicePolicy::Reject,
//! )
//! .unwrap();
//!
//! let total = compute_grand_total(Money::new(1_256_000), baggage, services.total);
//! assert_eq!(total, Money::new(1_766_000));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::catalog::ServiceCatalog;
use crate::error::CatalogLookupError;
use crate::money::Money;
use crate::types::{BookingSelection, Leg, Passenger, PassengerType};

/// Per-passenger price charged for a service id missing from the catalog
/// when the fallback policy is in effect.
pub const DEFAULT_FALLBACK_UNIT_PRICE: Money = Money::new(50_000);

// =============================================================================
// Unknown Service Policy
// =============================================================================

/// How to price a selected service id that the catalog does not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownServicePolicy {
    /// Fail the calculation with [`CatalogLookupError`].
    Reject,
    /// Charge this unit price per passenger and report the id as unresolved.
    Fallback(Money),
}

impl Default for UnknownServicePolicy {
    fn default() -> Self {
        UnknownServicePolicy::Fallback(DEFAULT_FALLBACK_UNIT_PRICE)
    }
}

// =============================================================================
// Baggage
// =============================================================================

/// Sums every passenger's baggage addon price.
///
/// Passengers without an addon contribute nothing. Negative stored prices
/// are clamped to zero, so the result is never negative.
pub fn compute_baggage_total(passengers: &[Passenger]) -> Money {
    passengers
        .iter()
        .filter_map(|p| p.extra_baggage.map(|addon| (p, addon)))
        .map(|(p, addon)| {
            if addon.price.is_negative() {
                warn!(
                    passenger_id = %p.id,
                    price = addon.price.amount(),
                    "Negative baggage price clamped to zero"
                );
            }
            addon.price.clamp_non_negative()
        })
        .sum()
}

// =============================================================================
// Services
// =============================================================================

/// One priced service in a services total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub service_id: String,
    pub label: String,
    pub unit_price: Money,
    pub quantity: usize,
    pub line_total: Money,
    /// True when `unit_price` is the fallback, not a catalog price.
    pub fallback: bool,
}

/// Result of pricing the shared service selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServicesTotal {
    pub total: Money,
    pub lines: Vec<ServiceLine>,
    /// Ids priced with the fallback unit price.
    pub unresolved: Vec<String>,
}

/// Prices the selected services for `passenger_count` passengers.
///
/// Each distinct selected id costs `unit_price × passenger_count`; a
/// repeated id is charged once. Ids missing from
/// the catalog either fail the whole calculation (`Reject`) or are charged
/// the fallback price and listed in `unresolved` (`Fallback`).
///
/// A zero passenger count yields a zero total; preventing empty bookings
/// is the caller's job.
pub fn compute_services_total<I, S>(
    selected_service_ids: I,
    catalog: &ServiceCatalog,
    passenger_count: usize,
    policy: UnknownServicePolicy,
) -> Result<ServicesTotal, CatalogLookupError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = ServicesTotal::default();
    let mut seen = BTreeSet::new();

    for id in selected_service_ids {
        let id = id.as_ref();
        if !seen.insert(id.to_string()) {
            debug!(service_id = %id, "Ignoring repeated service selection");
            continue;
        }
        let (label, unit_price, fallback) = match catalog.unit_price(id) {
            Ok(price) => {
                let label = catalog.get(id).map(|e| e.label.clone()).unwrap_or_default();
                (label, price, false)
            }
            Err(err) => match policy {
                UnknownServicePolicy::Reject => return Err(err),
                UnknownServicePolicy::Fallback(price) => {
                    warn!(
                        service_id = %id,
                        fallback_unit_price = price.amount(),
                        passenger_count,
                        "Service addon not in catalog, charging fallback price"
                    );
                    result.unresolved.push(id.to_string());
                    (id.to_string(), price, true)
                }
            },
        };

        let line_total = unit_price.multiply_count(passenger_count);
        result.total += line_total;
        result.lines.push(ServiceLine {
            service_id: id.to_string(),
            label,
            unit_price,
            quantity: passenger_count,
            line_total,
            fallback,
        });
    }

    Ok(result)
}

// =============================================================================
// Grand Total
// =============================================================================

/// The amount the user should be charged.
#[inline]
pub fn compute_grand_total(selection_price: Money, baggage_total: Money, services_total: Money) -> Money {
    selection_price + baggage_total + services_total
}

/// Re-derives the selection price from the per-type fare tables.
///
/// Returns `None` when any leg or passenger type needed is not quoted,
/// i.e. the cross-check cannot be done.
pub fn expected_selection_price(selection: &BookingSelection, passengers: &[Passenger]) -> Option<Money> {
    fare_lines(selection, passengers).map(|lines| lines.iter().map(|l| l.line_total).sum())
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Fare for all passengers of one type on one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FareLine {
    pub leg: Leg,
    pub passenger_type: PassengerType,
    pub count: usize,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Baggage bought by one passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BaggageLine {
    pub passenger_id: String,
    pub extra_kg: u32,
    pub price: Money,
}

/// Itemised price of a booking, as sent with the booking request.
///
/// `fare_lines` is empty when the selection carries no per-type fare
/// tables; `selection_price` is always the authoritative search total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub currency: String,
    pub fare_lines: Vec<FareLine>,
    pub baggage_lines: Vec<BaggageLine>,
    pub service_lines: Vec<ServiceLine>,
    pub unresolved_services: Vec<String>,
    pub selection_price: Money,
    pub baggage_total: Money,
    pub services_total: Money,
    pub grand_total: Money,
}

/// Builds the itemised breakdown from already-priced services.
pub fn build_breakdown(
    selection: &BookingSelection,
    passengers: &[Passenger],
    services: &ServicesTotal,
) -> PriceBreakdown {
    let baggage_lines: Vec<BaggageLine> = passengers
        .iter()
        .filter_map(|p| {
            p.extra_baggage.map(|addon| BaggageLine {
                passenger_id: p.id.clone(),
                extra_kg: addon.extra_kg,
                price: addon.price.clamp_non_negative(),
            })
        })
        .collect();
    let baggage_total = compute_baggage_total(passengers);

    PriceBreakdown {
        currency: selection.currency.clone(),
        fare_lines: fare_lines(selection, passengers).unwrap_or_default(),
        baggage_lines,
        service_lines: services.lines.clone(),
        unresolved_services: services.unresolved.clone(),
        selection_price: selection.total_price,
        baggage_total,
        services_total: services.total,
        grand_total: compute_grand_total(selection.total_price, baggage_total, services.total),
    }
}

fn fare_lines(selection: &BookingSelection, passengers: &[Passenger]) -> Option<Vec<FareLine>> {
    let mut lines = Vec::new();
    for (leg, pricing) in selection.priced_legs() {
        let pricing = pricing?;
        for passenger_type in PassengerType::ALL {
            let count = passengers
                .iter()
                .filter(|p| p.passenger_type == passenger_type)
                .count();
            if count == 0 {
                continue;
            }
            let unit_price = pricing.unit_price(passenger_type)?;
            lines.push(FareLine {
                leg,
                passenger_type,
                count,
                unit_price,
                line_total: unit_price.multiply_count(count),
            });
        }
    }
    Some(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServiceAddon;
    use crate::types::{FarePricing, TripType};

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::new(vec![
            ServiceAddon::new("insurance", "Travel insurance", Money::new(150_000)),
            ServiceAddon::new("checkin", "Priority check-in", Money::new(100_000)),
        ])
        .unwrap()
    }

    fn adult(id: &str) -> Passenger {
        Passenger::new(id, PassengerType::Adult)
    }

    #[test]
    fn test_grand_total_is_additive() {
        for (s, b, v) in [(0, 0, 0), (1_256_000, 0, 0), (1_256_000, 260_000, 250_000), (7, 11, 13)] {
            assert_eq!(
                compute_grand_total(Money::new(s), Money::new(b), Money::new(v)),
                Money::new(s + b + v)
            );
        }
    }

    #[test]
    fn test_baggage_total_skips_missing_addons() {
        let passengers = vec![
            adult("a").with_baggage(15, Money::new(260_000)),
            adult("b"),
            Passenger::new("c", PassengerType::Child).with_baggage(20, Money::new(320_000)),
        ];
        assert_eq!(compute_baggage_total(&passengers), Money::new(580_000));
        // Pure: same answer every time
        assert_eq!(compute_baggage_total(&passengers), compute_baggage_total(&passengers));
    }

    #[test]
    fn test_baggage_total_clamps_negative_prices() {
        let passengers = vec![
            adult("a").with_baggage(15, Money::new(-260_000)),
            adult("b").with_baggage(5, Money::new(100_000)),
        ];
        assert_eq!(compute_baggage_total(&passengers), Money::new(100_000));
    }

    #[test]
    fn test_services_total_per_passenger() {
        let services =
            compute_services_total(["insurance", "checkin"], &catalog(), 2, UnknownServicePolicy::Reject)
                .unwrap();
        assert_eq!(services.total, Money::new(500_000));
        assert_eq!(services.lines.len(), 2);
        assert_eq!(services.lines[0].line_total, Money::new(300_000));
        assert!(services.unresolved.is_empty());
    }

    #[test]
    fn test_repeated_service_id_charged_once() {
        let services = compute_services_total(
            ["insurance", "checkin", "insurance"],
            &catalog(),
            1,
            UnknownServicePolicy::Reject,
        )
        .unwrap();
        assert_eq!(services.total, Money::new(250_000));
        assert_eq!(services.lines.len(), 2);

        let unknown =
            compute_services_total(["wifi", "wifi"], &catalog(), 3, UnknownServicePolicy::default()).unwrap();
        assert_eq!(unknown.total, Money::new(150_000));
        assert_eq!(unknown.unresolved, vec!["wifi".to_string()]);
    }

    #[test]
    fn test_services_total_zero_passengers() {
        let services =
            compute_services_total(["insurance"], &catalog(), 0, UnknownServicePolicy::default()).unwrap();
        assert_eq!(services.total, Money::zero());
    }

    #[test]
    fn test_unknown_service_fallback() {
        let services =
            compute_services_total(["wifi"], &catalog(), 3, UnknownServicePolicy::default()).unwrap();
        assert_eq!(services.total, Money::new(150_000));
        assert_eq!(services.unresolved, vec!["wifi".to_string()]);
        assert!(services.lines[0].fallback);
    }

    #[test]
    fn test_unknown_service_custom_fallback() {
        let services =
            compute_services_total(["wifi"], &catalog(), 2, UnknownServicePolicy::Fallback(Money::new(10)))
                .unwrap();
        assert_eq!(services.total, Money::new(20));
    }

    #[test]
    fn test_unknown_service_reject() {
        let err = compute_services_total(["insurance", "wifi"], &catalog(), 1, UnknownServicePolicy::Reject)
            .unwrap_err();
        assert_eq!(err, CatalogLookupError::UnknownService("wifi".to_string()));
    }

    #[test]
    fn test_expected_selection_price_round_trip() {
        let fares = FarePricing {
            adult: Some(Money::new(600_000)),
            child: Some(Money::new(450_000)),
            infant: Some(Money::new(100_000)),
        };
        let selection = BookingSelection::new(Money::new(2_300_000), "VND", TripType::RoundTrip)
            .with_outbound(fares)
            .with_inbound(fares);
        let passengers = vec![adult("a"), Passenger::new("c", PassengerType::Child)];

        assert_eq!(
            expected_selection_price(&selection, &passengers),
            Some(Money::new(2 * (600_000 + 450_000)))
        );
    }

    #[test]
    fn test_expected_selection_price_not_derivable() {
        let fares = FarePricing {
            adult: Some(Money::new(600_000)),
            ..FarePricing::default()
        };
        let passengers = vec![adult("a"), Passenger::new("i", PassengerType::Infant)];

        let one_way = BookingSelection::new(Money::new(600_000), "VND", TripType::OneWay).with_outbound(fares);
        assert_eq!(expected_selection_price(&one_way, &passengers), None);

        let missing_inbound = BookingSelection::new(Money::new(1_200_000), "VND", TripType::RoundTrip)
            .with_outbound(fares);
        assert_eq!(expected_selection_price(&missing_inbound, &[adult("a")]), None);

        let no_tables = BookingSelection::new(Money::new(600_000), "VND", TripType::OneWay);
        assert_eq!(expected_selection_price(&no_tables, &[adult("a")]), None);
    }

    #[test]
    fn test_breakdown_addons_scenario() {
        let fares = FarePricing {
            adult: Some(Money::new(1_256_000)),
            ..FarePricing::default()
        };
        let selection = BookingSelection::new(Money::new(1_256_000), "VND", TripType::OneWay).with_outbound(fares);
        let passengers = vec![adult("adult-1").with_baggage(15, Money::new(260_000))];
        let services =
            compute_services_total(["insurance", "checkin"], &catalog(), 1, UnknownServicePolicy::Reject).unwrap();

        let breakdown = build_breakdown(&selection, &passengers, &services);
        assert_eq!(breakdown.baggage_total, Money::new(260_000));
        assert_eq!(breakdown.services_total, Money::new(250_000));
        assert_eq!(breakdown.grand_total, Money::new(1_766_000));
        assert_eq!(breakdown.fare_lines.len(), 1);
        assert_eq!(breakdown.baggage_lines[0].extra_kg, 15);
    }
}
