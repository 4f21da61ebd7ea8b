//! # Booking Session
//!
//! One booking flow's worth of pricing state: rules, catalog, validator
//! and its own audit trail.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Booking flow              BookingSession call          Audit entry     │
//! │  ────────────────          ───────────────────          ───────────     │
//! │  Addon step renders  ────► quote()               ────►  "quote"         │
//! │  User clicks Book    ────► check_submission()    ────►  "submission"    │
//! │  API answers         ────► reconcile_response()  ────►  "api_response"  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session owns its `AuditLogger`, so two concurrent bookings never
//! see each other's snapshots.

use std::collections::BTreeSet;

use tracing::info;
use uuid::Uuid;

use crate::audit::AuditLogger;
use crate::calculator::{build_breakdown, compute_baggage_total, compute_services_total, PriceBreakdown, ServicesTotal};
use crate::catalog::ServiceCatalog;
use crate::error::CoreResult;
use crate::money::Money;
use crate::reconcile::{reconcile, Reconciliation};
use crate::rules::PricingRules;
use crate::types::{BookingSelection, Passenger, PriceAuditEntry, ValidationResult};
use crate::validation::{ApiPriceCheck, PriceValidator};

/// Outcome of a post-submission check: the classification and the price
/// decision taken from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub check: ApiPriceCheck,
    pub reconciliation: Reconciliation,
}

#[derive(Debug)]
pub struct BookingSession {
    id: Uuid,
    catalog: ServiceCatalog,
    validator: PriceValidator,
    audit: AuditLogger,
}

impl BookingSession {
    /// Starts a session after checking the rules.
    pub fn new(rules: PricingRules, catalog: ServiceCatalog) -> CoreResult<Self> {
        rules.validate()?;
        let audit = AuditLogger::new(rules.audit_capacity);
        Ok(BookingSession {
            id: Uuid::new_v4(),
            catalog,
            validator: PriceValidator::new(rules),
            audit,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn rules(&self) -> &PricingRules {
        self.validator.rules()
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn validator(&self) -> &PriceValidator {
        &self.validator
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Prices the selected services under the session's unknown-id policy.
    pub fn price_services(&self, selected_service_ids: &BTreeSet<String>, passenger_count: usize) -> CoreResult<ServicesTotal> {
        let services = compute_services_total(
            selected_service_ids,
            &self.catalog,
            passenger_count,
            self.rules().unknown_service_policy(),
        )?;
        Ok(services)
    }

    /// Itemised price for the current selection, recorded as a `quote` snapshot.
    pub fn quote(
        &self,
        selection: &BookingSelection,
        passengers: &[Passenger],
        selected_service_ids: &BTreeSet<String>,
    ) -> CoreResult<PriceBreakdown> {
        let services = self.price_services(selected_service_ids, passengers.len())?;
        let breakdown = build_breakdown(selection, passengers, &services);

        let mut entry = PriceAuditEntry::capture(
            "quote",
            selection,
            passengers.len(),
            breakdown.baggage_total,
            breakdown.services_total,
        )
        .with_detail("session", self.id);
        if !services.unresolved.is_empty() {
            entry = entry.with_detail("unresolved_services", services.unresolved.join(","));
        }
        self.audit.log_entry(entry);

        Ok(breakdown)
    }

    /// Full pre-submission check against the total the UI is about to send.
    ///
    /// Fallback-priced services are reported as warnings so they are never
    /// charged silently.
    pub fn check_submission(
        &self,
        selection: &BookingSelection,
        passengers: &[Passenger],
        selected_service_ids: &BTreeSet<String>,
        expected_total: Money,
    ) -> CoreResult<ValidationResult> {
        let services = self.price_services(selected_service_ids, passengers.len())?;
        let baggage_total = compute_baggage_total(passengers);

        let mut result = self.validator.validate_price_calculation(
            selection,
            passengers,
            baggage_total,
            services.total,
            expected_total,
            "submission",
        );

        for line in services.lines.iter().filter(|l| l.fallback) {
            result.warnings.push(format!(
                "Service '{}' is not in the catalog; charged fallback price {} x {} = {}",
                line.service_id, line.unit_price, line.quantity, line.line_total
            ));
        }

        result.audit_trail = result
            .audit_trail
            .clone()
            .with_detail("session", self.id)
            .with_detail("valid", result.is_valid);
        self.audit.log_entry(result.audit_trail.clone());

        Ok(result)
    }

    /// Classifies the booking API's total, applies the trust policy and
    /// records both as an `api_response` snapshot.
    pub fn reconcile_response(
        &self,
        frontend_price: Money,
        api_price: Money,
        reference_id: &str,
        currency: &str,
    ) -> ResponseOutcome {
        let check = self
            .validator
            .validate_api_response_price(frontend_price, api_price, reference_id, currency);
        let reconciliation = reconcile(&check, self.rules().trust_policy);

        self.audit.log_entry(
            PriceAuditEntry::for_total("api_response", frontend_price, currency)
                .with_detail("session", self.id)
                .with_detail("reference_id", reference_id)
                .with_detail("frontend_price", frontend_price.amount())
                .with_detail("api_price", api_price.amount())
                .with_detail("divergence", check.divergence)
                .with_detail("should_investigate", check.should_investigate)
                .with_detail("policy", reconciliation.policy)
                .with_detail("displayed_price", reconciliation.displayed_price.amount())
                .with_detail("needs_review", reconciliation.needs_review),
        );
        if reconciliation.needs_review {
            info!(
                session = %self.id,
                reference_id,
                policy = %reconciliation.policy,
                displayed = reconciliation.displayed_price.amount(),
                "Booking price flagged for review"
            );
        }

        ResponseOutcome { check, reconciliation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::reconcile::{PriceSource, TrustPolicy};
    use crate::rules::UnknownServiceMode;
    use crate::types::{PassengerType, TripType};

    fn selection() -> BookingSelection {
        BookingSelection::new(Money::new(1_256_000), "VND", TripType::OneWay)
    }

    fn ids(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rejects_invalid_rules() {
        let rules = PricingRules {
            audit_capacity: 0,
            ..PricingRules::default()
        };
        assert!(matches!(
            BookingSession::new(rules, ServiceCatalog::standard()),
            Err(CoreError::InvalidRules(_))
        ));
    }

    #[test]
    fn test_quote_and_submission_are_audited() {
        let session = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();
        let passengers = vec![Passenger::new("adult-1", PassengerType::Adult).with_baggage(15, Money::new(260_000))];
        let services = ids(&["travel_insurance", "priority_checkin"]);

        let breakdown = session.quote(&selection(), &passengers, &services).unwrap();
        assert_eq!(breakdown.grand_total, Money::new(1_766_000));

        let result = session
            .check_submission(&selection(), &passengers, &services, breakdown.grand_total)
            .unwrap();
        assert!(result.is_valid);

        let steps: Vec<String> = session.audit().entries().into_iter().map(|e| e.step).collect();
        assert_eq!(steps, vec!["quote".to_string(), "submission".to_string()]);
    }

    #[test]
    fn test_fallback_service_surfaces_warning() {
        let session = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();
        let passengers: Vec<Passenger> = (1..=3)
            .map(|i| Passenger::new(format!("adult-{}", i), PassengerType::Adult))
            .collect();
        let selection = BookingSelection::new(Money::new(3_000_000), "VND", TripType::OneWay);

        let result = session
            .check_submission(&selection, &passengers, &ids(&["wifi"]), Money::new(3_150_000))
            .unwrap();
        assert!(result.is_valid);
        assert_eq!(result.calculated_total, Money::new(3_150_000));
        assert_eq!(
            result.warnings,
            vec!["Service 'wifi' is not in the catalog; charged fallback price 50,000 x 3 = 150,000".to_string()]
        );
    }

    #[test]
    fn test_reject_mode_returns_error() {
        let rules = PricingRules {
            unknown_service: UnknownServiceMode::Reject,
            ..PricingRules::default()
        };
        let session = BookingSession::new(rules, ServiceCatalog::standard()).unwrap();
        let passengers = vec![Passenger::new("adult-1", PassengerType::Adult)];

        let err = session.quote(&selection(), &passengers, &ids(&["wifi"])).unwrap_err();
        assert!(matches!(err, CoreError::Catalog(_)));
        assert!(session.audit().is_empty());
    }

    #[test]
    fn test_reconcile_response_uses_policy() {
        let rules = PricingRules {
            trust_policy: TrustPolicy::TrustServer,
            ..PricingRules::default()
        };
        let session = BookingSession::new(rules, ServiceCatalog::standard()).unwrap();

        let outcome = session.reconcile_response(Money::new(1_000_000), Money::new(1_060_000), "B1", "VND");
        assert!(outcome.check.should_investigate);
        assert_eq!(outcome.reconciliation.source, PriceSource::Server);
        assert_eq!(outcome.reconciliation.displayed_price, Money::new(1_060_000));
    }

    #[test]
    fn test_reconcile_response_is_audited() {
        let session = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();

        session.reconcile_response(Money::new(1_000_000), Money::new(1_060_000), "B1", "VND");
        assert_eq!(session.audit().len(), 1);

        let entry = session.audit().latest().unwrap();
        assert_eq!(entry.step, "api_response");
        assert_eq!(entry.calculated_total, Money::new(1_000_000));
        assert_eq!(entry.currency, "VND");

        let details = entry.details.unwrap();
        assert_eq!(details["reference_id"], "B1");
        assert_eq!(details["frontend_price"], "1000000");
        assert_eq!(details["api_price"], "1060000");
        assert_eq!(details["divergence"], "backend_higher");
        assert_eq!(details["should_investigate"], "true");
        assert_eq!(details["policy"], "trust_client");
        assert_eq!(details["displayed_price"], "1000000");
    }

    #[test]
    fn test_repeated_service_ids_charged_once() {
        let session = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();
        let passengers = vec![Passenger::new("adult-1", PassengerType::Adult)];
        let services = ids(&["travel_insurance", "travel_insurance"]);

        let breakdown = session.quote(&selection(), &passengers, &services).unwrap();
        assert_eq!(breakdown.services_total, Money::new(150_000));
        assert_eq!(breakdown.grand_total, Money::new(1_406_000));
    }

    #[test]
    fn test_sessions_do_not_share_audit_trails() {
        let a = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();
        let b = BookingSession::new(PricingRules::default(), ServiceCatalog::standard()).unwrap();
        let passengers = vec![Passenger::new("adult-1", PassengerType::Adult)];

        a.quote(&selection(), &passengers, &BTreeSet::new()).unwrap();
        assert_eq!(a.audit().len(), 1);
        assert!(b.audit().is_empty());
        assert_ne!(a.id(), b.id());
    }
}
