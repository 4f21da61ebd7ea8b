//! # Service Addon Catalog
//!
//! Static reference data for shared service addons, plus the booking-wide
//! addon selection whose total is always derived from it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Addon step                                                             │
//! │                                                                         │
//! │  User ticks "Travel insurance"                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GlobalAddons::toggle("travel_insurance")                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  extra_price_total = Σ unit_price × party size   (recomputed, never set)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calculator::{compute_services_total, ServicesTotal, UnknownServicePolicy};
use crate::error::{CatalogLookupError, CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Catalog Entry
// =============================================================================

/// One purchasable service, priced per passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddon {
    pub id: String,
    pub label: String,
    pub unit_price: Money,
}

impl ServiceAddon {
    pub fn new(id: impl Into<String>, label: impl Into<String>, unit_price: Money) -> Self {
        ServiceAddon {
            id: id.into(),
            label: label.into(),
            unit_price,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Immutable, id-unique list of service addons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    entries: Vec<ServiceAddon>,
}

impl ServiceCatalog {
    /// Builds a catalog, rejecting blank ids, duplicate ids and negative prices.
    pub fn new(entries: Vec<ServiceAddon>) -> CoreResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "service id".to_string(),
                }
                .into());
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "service id".to_string(),
                    value: entry.id.clone(),
                }
                .into());
            }
            if entry.unit_price.is_negative() {
                return Err(CoreError::InvalidCatalog(format!(
                    "service '{}' has negative unit price {}",
                    entry.id, entry.unit_price
                )));
            }
        }
        Ok(ServiceCatalog { entries })
    }

    /// The services offered on the addon step of the booking flow.
    pub fn standard() -> Self {
        ServiceCatalog {
            entries: vec![
                ServiceAddon::new("priority_checkin", "Priority check-in", Money::new(100_000)),
                ServiceAddon::new("travel_insurance", "Travel insurance", Money::new(150_000)),
                ServiceAddon::new("inflight_meal", "In-flight meal", Money::new(120_000)),
                ServiceAddon::new("seat_selection", "Preferred seat", Money::new(80_000)),
                ServiceAddon::new("fast_track", "Fast-track security", Money::new(200_000)),
                ServiceAddon::new("lounge_access", "Business lounge", Money::new(450_000)),
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&ServiceAddon> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Unit price of a service. Unknown ids are an error here; whether to
    /// fall back is decided by the calculator's policy.
    pub fn unit_price(&self, id: &str) -> Result<Money, CatalogLookupError> {
        self.get(id)
            .map(|e| e.unit_price)
            .ok_or_else(|| CatalogLookupError::UnknownService(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[ServiceAddon] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for ServiceCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<ServiceAddon>::deserialize(deserializer)?;
        ServiceCatalog::new(entries).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Global Addons State
// =============================================================================

/// Booking-wide service selection.
///
/// `extra_price_total` is private and recomputed on every change, so it
/// can never drift from the selected ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAddons {
    selected_service_ids: BTreeSet<String>,
    extra_price_total: Money,
    #[serde(skip)]
    passenger_count: usize,
    #[serde(skip)]
    policy: UnknownServicePolicy,
    #[serde(skip)]
    unresolved: Vec<String>,
}

impl GlobalAddons {
    /// Empty selection for a party of `passenger_count`.
    pub fn new(passenger_count: usize, policy: UnknownServicePolicy) -> Self {
        GlobalAddons {
            selected_service_ids: BTreeSet::new(),
            extra_price_total: Money::zero(),
            passenger_count,
            policy,
            unresolved: Vec::new(),
        }
    }

    /// Adds a service. Returns `Ok(false)` if it was already selected.
    ///
    /// On a lookup error the selection is left unchanged.
    pub fn select(&mut self, id: &str, catalog: &ServiceCatalog) -> Result<bool, CatalogLookupError> {
        if self.selected_service_ids.contains(id) {
            return Ok(false);
        }
        self.selected_service_ids.insert(id.to_string());
        if let Err(e) = self.recompute(catalog) {
            self.selected_service_ids.remove(id);
            self.recompute(catalog)?;
            return Err(e);
        }
        Ok(true)
    }

    /// Removes a service. Returns `Ok(false)` if it was not selected.
    pub fn deselect(&mut self, id: &str, catalog: &ServiceCatalog) -> Result<bool, CatalogLookupError> {
        if !self.selected_service_ids.remove(id) {
            return Ok(false);
        }
        self.recompute(catalog)?;
        Ok(true)
    }

    /// Flips a service on or off, returning whether it is now selected.
    pub fn toggle(&mut self, id: &str, catalog: &ServiceCatalog) -> Result<bool, CatalogLookupError> {
        if self.selected_service_ids.contains(id) {
            self.deselect(id, catalog)?;
            Ok(false)
        } else {
            self.select(id, catalog)?;
            Ok(true)
        }
    }

    /// Re-prices the selection after the party size changed.
    pub fn set_passenger_count(
        &mut self,
        passenger_count: usize,
        catalog: &ServiceCatalog,
    ) -> Result<(), CatalogLookupError> {
        self.passenger_count = passenger_count;
        self.recompute(catalog)
    }

    pub fn selected_service_ids(&self) -> &BTreeSet<String> {
        &self.selected_service_ids
    }

    pub fn extra_price_total(&self) -> Money {
        self.extra_price_total
    }

    pub fn passenger_count(&self) -> usize {
        self.passenger_count
    }

    /// Selected ids that were priced with the fallback unit price.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Full services breakdown for the current selection.
    pub fn services_total(&self, catalog: &ServiceCatalog) -> Result<ServicesTotal, CatalogLookupError> {
        compute_services_total(&self.selected_service_ids, catalog, self.passenger_count, self.policy)
    }

    fn recompute(&mut self, catalog: &ServiceCatalog) -> Result<(), CatalogLookupError> {
        let services = self.services_total(catalog)?;
        self.extra_price_total = services.total;
        self.unresolved = services.unresolved;
        Ok(())
    }
}
