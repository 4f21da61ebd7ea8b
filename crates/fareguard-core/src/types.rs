//! # Domain Types
//!
//! Records exchanged between the booking UI and the price core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │ BookingSelection │   │    Passenger     │   │ PriceAuditEntry  │     │
//! │  │ ──────────────── │   │ ──────────────── │   │ ──────────────── │     │
//! │  │ outbound_pricing │   │ id               │   │ timestamp        │     │
//! │  │ inbound_pricing? │   │ passenger_type   │   │ step             │     │
//! │  │ total_price      │   │ extra_baggage? ──┼─┐ │ calculated_total │     │
//! │  │ currency         │   └──────────────────┘ │ └──────────────────┘     │
//! │  │ trip_type        │                        ▼                          │
//! │  └──────────────────┘               ┌──────────────────┐                │
//! │                                     │  PassengerAddon  │                │
//! │  ┌──────────────────┐               │ extra_kg, price  │                │
//! │  │ ValidationResult │               └──────────────────┘                │
//! │  │ is_valid, errors │                                                   │
//! │  │ warnings, audit  │                                                   │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names serialize in camelCase to match the front end's JSON.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Passenger Type
// =============================================================================

/// Fare category of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PassengerType {
    Adult,
    Child,
    Infant,
}

impl PassengerType {
    /// All passenger types in booking-form order.
    pub const ALL: [PassengerType; 3] = [
        PassengerType::Adult,
        PassengerType::Child,
        PassengerType::Infant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerType::Adult => "adult",
            PassengerType::Child => "child",
            PassengerType::Infant => "infant",
        }
    }
}

impl fmt::Display for PassengerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Passenger Addon
// =============================================================================

/// Extra checked baggage bought for a single passenger.
///
/// Replaced wholesale when the passenger picks another tier. A passenger
/// with no selection has `None`, never a zero-kg addon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PassengerAddon {
    pub extra_kg: u32,
    pub price: Money,
}

// =============================================================================
// Passenger
// =============================================================================

/// A passenger slot in the booking form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub id: String,

    #[serde(rename = "type")]
    pub passenger_type: PassengerType,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub extra_baggage: Option<PassengerAddon>,
}

impl Passenger {
    /// Creates an empty passenger slot.
    pub fn new(id: impl Into<String>, passenger_type: PassengerType) -> Self {
        Passenger {
            id: id.into(),
            passenger_type,
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: None,
            extra_baggage: None,
        }
    }

    /// Builder-style baggage selection, mostly for tests and scenario setup.
    pub fn with_baggage(mut self, extra_kg: u32, price: Money) -> Self {
        self.extra_baggage = Some(PassengerAddon { extra_kg, price });
        self
    }

    /// Creates one blank slot per seat in the party.
    ///
    /// Slots are ordered adults, then children, then infants, with ids
    /// `adult-1`, `adult-2`, `child-1`, ...
    ///
    /// ```rust
    /// use fareguard_core::types::{Passenger, PartySize};
    ///
    /// let slots = Passenger::slots_for(&PartySize::new(2, 1, 0));
    /// let ids: Vec<_> = slots.iter().map(|p| p.id.as_str()).collect();
    /// assert_eq!(ids, ["adult-1", "adult-2", "child-1"]);
    /// ```
    pub fn slots_for(party: &PartySize) -> Vec<Passenger> {
        let mut slots = Vec::with_capacity(party.total());
        for passenger_type in PassengerType::ALL {
            for n in 1..=party.count(passenger_type) {
                slots.push(Passenger::new(format!("{}-{}", passenger_type, n), passenger_type));
            }
        }
        slots
    }
}

// =============================================================================
// Party Size
// =============================================================================

/// Head counts chosen on the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PartySize {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl PartySize {
    pub const fn new(adults: u32, children: u32, infants: u32) -> Self {
        PartySize {
            adults,
            children,
            infants,
        }
    }

    pub fn count(&self, passenger_type: PassengerType) -> u32 {
        match passenger_type {
            PassengerType::Adult => self.adults,
            PassengerType::Child => self.children,
            PassengerType::Infant => self.infants,
        }
    }

    /// Total number of passengers, infants included.
    pub fn total(&self) -> usize {
        (self.adults + self.children + self.infants) as usize
    }

    /// Counts passengers by type from an existing passenger list.
    pub fn from_passengers(passengers: &[Passenger]) -> Self {
        passengers
            .iter()
            .fold(PartySize::default(), |mut party, p| {
                match p.passenger_type {
                    PassengerType::Adult => party.adults += 1,
                    PassengerType::Child => party.children += 1,
                    PassengerType::Infant => party.infants += 1,
                }
                party
            })
    }
}

// =============================================================================
// Trip Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one_way",
            TripType::RoundTrip => "round_trip",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Fare Pricing
// =============================================================================

/// Per-passenger-type unit fares for one flight leg, as shown on the
/// search result card. A missing type means the search did not quote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FarePricing {
    #[serde(default)]
    pub adult: Option<Money>,
    #[serde(default)]
    pub child: Option<Money>,
    #[serde(default)]
    pub infant: Option<Money>,
}

impl FarePricing {
    pub fn unit_price(&self, passenger_type: PassengerType) -> Option<Money> {
        match passenger_type {
            PassengerType::Adult => self.adult,
            PassengerType::Child => self.child,
            PassengerType::Infant => self.infant,
        }
    }
}

// =============================================================================
// Booking Selection
// =============================================================================

/// The flights picked on the search page.
///
/// `total_price` is the fare total agreed at search time and is the
/// authoritative selection price; the per-type tables are only used to
/// cross-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingSelection {
    #[serde(default)]
    pub outbound_pricing: Option<FarePricing>,

    #[serde(default)]
    pub inbound_pricing: Option<FarePricing>,

    pub total_price: Money,

    pub currency: String,

    #[serde(default)]
    pub trip_type: TripType,
}

impl BookingSelection {
    /// A selection without per-type fare tables.
    pub fn new(total_price: Money, currency: impl Into<String>, trip_type: TripType) -> Self {
        BookingSelection {
            outbound_pricing: None,
            inbound_pricing: None,
            total_price,
            currency: currency.into(),
            trip_type,
        }
    }

    pub fn with_outbound(mut self, pricing: FarePricing) -> Self {
        self.outbound_pricing = Some(pricing);
        self
    }

    pub fn with_inbound(mut self, pricing: FarePricing) -> Self {
        self.inbound_pricing = Some(pricing);
        self
    }

    /// Legs whose fares make up the selection price.
    pub fn priced_legs(&self) -> Vec<(Leg, Option<&FarePricing>)> {
        let mut legs = vec![(Leg::Outbound, self.outbound_pricing.as_ref())];
        if self.trip_type == TripType::RoundTrip {
            legs.push((Leg::Inbound, self.inbound_pricing.as_ref()));
        }
        legs
    }
}

/// Direction of a flight leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Outbound,
    Inbound,
}

// =============================================================================
// Price Audit Entry
// =============================================================================

/// Snapshot of one price calculation, kept for diagnostic replay.
///
/// Never used to decide anything; the audit trail is a debugging aid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceAuditEntry {
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub step: String,
    pub selection_price: Money,
    pub baggage_total: Money,
    pub services_total: Money,
    pub addons_total: Money,
    pub calculated_total: Money,
    pub currency: String,
    pub passenger_count: usize,
    pub trip_type: TripType,
    #[serde(default)]
    pub details: Option<BTreeMap<String, String>>,
}

impl PriceAuditEntry {
    /// Captures the current totals for `step`, stamped with the current time.
    pub fn capture(
        step: impl Into<String>,
        selection: &BookingSelection,
        passenger_count: usize,
        baggage_total: Money,
        services_total: Money,
    ) -> Self {
        let addons_total = baggage_total + services_total;
        PriceAuditEntry {
            timestamp: Utc::now(),
            step: step.into(),
            selection_price: selection.total_price,
            baggage_total,
            services_total,
            addons_total,
            calculated_total: selection.total_price + addons_total,
            currency: selection.currency.clone(),
            passenger_count,
            trip_type: selection.trip_type,
            details: None,
        }
    }

    /// Snapshot of a single total with no breakdown behind it, such as the
    /// front-end total sent to the booking API.
    pub fn for_total(step: impl Into<String>, total: Money, currency: impl Into<String>) -> Self {
        PriceAuditEntry {
            timestamp: Utc::now(),
            step: step.into(),
            selection_price: total,
            baggage_total: Money::zero(),
            services_total: Money::zero(),
            addons_total: Money::zero(),
            calculated_total: total,
            currency: currency.into(),
            passenger_count: 0,
            trip_type: TripType::default(),
            details: None,
        }
    }

    /// Attaches a free-form key/value detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.to_string());
        self
    }
}

// =============================================================================
// Validation Result
// =============================================================================

/// Outcome of a price consistency check.
///
/// `errors` block submission; `warnings` are for human review only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub calculated_total: Money,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub audit_trail: PriceAuditEntry,
}

// =============================================================================
// Unit Tests
// =============================================================================
