//! # fareguard-core: Booking Price Reconciliation
//!
//! Computes what a flight booking should cost, checks that figure against
//! what the UI expects and what the booking API returns, and keeps a short
//! audit trail of every calculation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Flight Booking Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Frontend (React)                             │    │
//! │  │   Search ──► Passengers ──► Addons ──► Review ──► Payment       │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ plain records                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ fareguard-core (THIS CRATE) ★                   │    │
//! │  │                                                                 │    │
//! │  │  ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌───────────┐  │    │
//! │  │  │ calculator │  │ validation │  │   audit    │  │ reconcile │  │    │
//! │  │  │  baggage   │  │ mismatch   │  │ bounded    │  │   trust   │  │    │
//! │  │  │  services  │  │ heuristics │  │ trail      │  │   policy  │  │    │
//! │  │  └────────────┘  └────────────┘  └────────────┘  └───────────┘  │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO HTTP • NO STORAGE • PURE FUNCTIONS                │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Whole-unit money with tolerance comparison
//! - [`types`] - Passengers, selections, audit entries, validation results
//! - [`catalog`] - Service addon catalog and booking-wide addon selection
//! - [`calculator`] - Baggage, services and grand totals
//! - [`validation`] - Price consistency checks and input validators
//! - [`audit`] - Bounded audit trail
//! - [`reconcile`] - Front-end vs backend trust policy
//! - [`rules`] - Named thresholds
//! - [`session`] - Per-booking facade over all of the above
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::BTreeSet;
//!
//! use fareguard_core::{BookingSession, Money, PricingRules, ServiceCatalog};
//! use fareguard_core::types::{BookingSelection, Passenger, PassengerType, TripType};
//!
//! let session = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();
//! let selection = BookingSelection::new(Money::new(1_256_000), "VND", TripType::OneWay);
//! let passengers = vec![Passenger::new("adult-1", PassengerType::Adult)];
//!
//! let result = session
//!     .check_submission(&selection, &passengers, &BTreeSet::new(), Money::new(1_256_000))
//!     .unwrap();
//! assert!(result.is_valid);
//! assert_eq!(session.audit().len(), 1);
//! ```

pub mod audit;
pub mod calculator;
pub mod catalog;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod rules;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::AuditLogger;
pub use catalog::{GlobalAddons, ServiceAddon, ServiceCatalog};
pub use error::{CatalogLookupError, CoreError, CoreResult, ValidationError};
pub use money::{Money, PRICE_TOLERANCE};
pub use reconcile::{Reconciliation, TrustPolicy};
pub use rules::PricingRules;
pub use session::BookingSession;
pub use types::*;
pub use validation::PriceValidator;
