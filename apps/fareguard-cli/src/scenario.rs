//! # Scenario Replay
//!
//! A scenario is a JSON snapshot of a booking as the front end saw it,
//! typically pasted from the debug panel into a bug report:
//!
//! ```json
//! {
//!   "selection": { "totalPrice": 1256000, "currency": "VND", "tripType": "one_way" },
//!   "passengers": [
//!     { "id": "adult-1", "type": "adult", "extraBaggage": { "extraKg": 15, "price": 260000 } }
//!   ],
//!   "selectedServices": ["travel_insurance", "priority_checkin"],
//!   "expectedTotal": 1766000,
//!   "apiResponse": { "referenceId": "B1", "totalPrice": 1766000 }
//! }
//! ```
//!
//! `selectedServices` is a set: a repeated id is selected once.
//! `expectedTotal` defaults to the calculated total, `catalog` to the
//! standard service catalog, and `apiResponse` is optional.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use fareguard_core::calculator::PriceBreakdown;
use fareguard_core::reconcile::Reconciliation;
use fareguard_core::validation::{validate_currency, validate_party_size, ApiPriceCheck};
use fareguard_core::{
    BookingSelection, BookingSession, Money, PartySize, Passenger, PricingRules, ServiceCatalog,
    ValidationResult,
};

use crate::error::CliResult;

/// Backend answer to a submitted booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub reference_id: String,
    pub total_price: Money,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub selection: BookingSelection,

    pub passengers: Vec<Passenger>,

    #[serde(default)]
    pub selected_services: BTreeSet<String>,

    #[serde(default)]
    pub expected_total: Option<Money>,

    #[serde(default)]
    pub api_response: Option<ApiResponse>,

    #[serde(default)]
    pub catalog: Option<ServiceCatalog>,
}

impl Scenario {
    pub fn from_json(contents: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Input problems worth mentioning that do not stop the replay.
    pub fn input_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Err(e) = validate_currency(&self.selection.currency) {
            notes.push(e.to_string());
        }
        if let Err(e) = validate_party_size(&PartySize::from_passengers(&self.passengers)) {
            notes.push(e.to_string());
        }
        notes
    }
}

/// API section of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSection {
    pub check: ApiPriceCheck,
    pub reconciliation: Reconciliation,
}

/// Everything learned from replaying one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: String,
    pub input_notes: Vec<String>,
    pub breakdown: PriceBreakdown,
    pub validation: ValidationResult,
    pub api: Option<ApiSection>,
    #[serde(skip)]
    pub audit_text: String,
}

impl Report {
    /// True when the booking would be submitted and shown without review.
    pub fn is_clean(&self) -> bool {
        self.validation.is_valid && self.api.as_ref().map_or(true, |api| !api.reconciliation.needs_review)
    }

    /// Multi-line summary for terminals.
    pub fn render_text(&self) -> String {
        let b = &self.breakdown;
        let v = &self.validation;
        let mut lines = vec![
            format!("Booking session {}", self.session_id),
            format!("  selection : {} {}", b.selection_price, b.currency),
            format!("  baggage   : {}", b.baggage_total),
            format!("  services  : {}", b.services_total),
            format!("  total     : {} {}", v.calculated_total, b.currency),
            format!("  status    : {}", if v.is_valid { "VALID" } else { "INVALID" }),
        ];
        lines.extend(self.input_notes.iter().map(|n| format!("  note      : {}", n)));
        lines.extend(v.errors.iter().map(|e| format!("  error     : {}", e)));
        lines.extend(v.warnings.iter().map(|w| format!("  warning   : {}", w)));

        if let Some(api) = &self.api {
            let record = &api.check.audit_log;
            lines.push(format!(
                "  api       : {} returned {} ({}, diff {} / {:.2}%)",
                record.reference_id,
                record.api_price,
                api.check.divergence,
                record.difference,
                record.percentage_diff
            ));
            lines.push(format!(
                "  displayed : {} ({}{})",
                api.reconciliation.displayed_price,
                api.reconciliation.policy,
                if api.reconciliation.needs_review { ", NEEDS REVIEW" } else { "" }
            ));
        }

        lines.push(String::new());
        lines.push(self.audit_text.clone());
        lines.join("\n")
    }
}

/// Runs a scenario through a fresh booking session.
pub fn replay(scenario: &Scenario, rules: &PricingRules) -> CliResult<Report> {
    let catalog = scenario.catalog.clone().unwrap_or_else(ServiceCatalog::standard);
    let session = BookingSession::new(rules.clone(), catalog)?;

    let breakdown = session.quote(&scenario.selection, &scenario.passengers, &scenario.selected_services)?;
    let expected_total = scenario.expected_total.unwrap_or(breakdown.grand_total);
    let validation = session.check_submission(
        &scenario.selection,
        &scenario.passengers,
        &scenario.selected_services,
        expected_total,
    )?;

    let api = scenario.api_response.as_ref().map(|response| {
        let outcome = session.reconcile_response(
            validation.calculated_total,
            response.total_price,
            &response.reference_id,
            &scenario.selection.currency,
        );
        ApiSection {
            check: outcome.check,
            reconciliation: outcome.reconciliation,
        }
    });

    info!(
        session = %session.id(),
        total = validation.calculated_total.amount(),
        valid = validation.is_valid,
        "Scenario replayed"
    );

    Ok(Report {
        session_id: session.id().to_string(),
        input_notes: scenario.input_notes(),
        breakdown,
        validation,
        api,
        audit_text: session.audit().export_as_text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use fareguard_core::rules::UnknownServiceMode;

    const ADDONS_SCENARIO: &str = r#"{
        "selection": { "totalPrice": 1256000, "currency": "VND", "tripType": "one_way" },
        "passengers": [
            { "id": "adult-1", "type": "adult", "extraBaggage": { "extraKg": 15, "price": 260000 } }
        ],
        "selectedServices": ["travel_insurance", "priority_checkin"],
        "expectedTotal": 1766000,
        "apiResponse": { "referenceId": "B1", "totalPrice": 1766000 }
    }"#;

    #[test]
    fn test_addons_scenario_is_clean() {
        let scenario = Scenario::from_json(ADDONS_SCENARIO).unwrap();
        let report = replay(&scenario, &PricingRules::default()).unwrap();

        assert!(report.validation.is_valid);
        assert_eq!(report.validation.calculated_total, Money::new(1_766_000));
        assert_eq!(report.breakdown.services_total, Money::new(250_000));
        assert!(report.input_notes.is_empty());
        assert!(report.is_clean());
        assert!(report.audit_text.contains("step=quote"));
        assert!(report.audit_text.contains("step=submission"));
        assert!(report.audit_text.contains("step=api_response"));
    }

    #[test]
    fn test_expected_total_defaults_to_calculated() {
        let scenario = Scenario::from_json(
            r#"{
                "selection": { "totalPrice": 1256000, "currency": "VND" },
                "passengers": [{ "id": "adult-1", "type": "adult" }]
            }"#,
        )
        .unwrap();
        let report = replay(&scenario, &PricingRules::default()).unwrap();
        assert!(report.validation.is_valid);
        assert!(report.api.is_none());
    }

    #[test]
    fn test_backend_divergence_needs_review() {
        let scenario = Scenario::from_json(
            r#"{
                "selection": { "totalPrice": 1000000, "currency": "VND" },
                "passengers": [{ "id": "adult-1", "type": "adult" }],
                "apiResponse": { "referenceId": "B1", "totalPrice": 1060000 }
            }"#,
        )
        .unwrap();
        let report = replay(&scenario, &PricingRules::default()).unwrap();
        let api = report.api.as_ref().unwrap();
        assert!(api.check.should_investigate);
        assert_eq!(api.reconciliation.displayed_price, Money::new(1_000_000));
        assert!(!report.is_clean());
        assert!(report.render_text().contains("NEEDS REVIEW"));
    }

    #[test]
    fn test_mismatched_expected_total_is_invalid() {
        let scenario = Scenario::from_json(
            r#"{
                "selection": { "totalPrice": 1000000, "currency": "VND" },
                "passengers": [{ "id": "adult-1", "type": "adult" }],
                "expectedTotal": 1000002
            }"#,
        )
        .unwrap();
        let report = replay(&scenario, &PricingRules::default()).unwrap();
        assert!(!report.validation.is_valid);
        assert!(report.render_text().contains("INVALID"));
    }

    #[test]
    fn test_repeated_service_selected_once() {
        let scenario = Scenario::from_json(
            r#"{
                "selection": { "totalPrice": 1256000, "currency": "VND" },
                "passengers": [{ "id": "adult-1", "type": "adult" }],
                "selectedServices": ["travel_insurance", "travel_insurance"]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.selected_services.len(), 1);

        let report = replay(&scenario, &PricingRules::default()).unwrap();
        assert_eq!(report.breakdown.services_total, Money::new(150_000));
        assert_eq!(report.validation.calculated_total, Money::new(1_406_000));
    }

    #[test]
    fn test_input_notes() {
        let scenario = Scenario::from_json(
            r#"{
                "selection": { "totalPrice": 1000000, "currency": "dong" },
                "passengers": [{ "id": "infant-1", "type": "infant" }]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.input_notes().len(), 2);
    }

    #[test]
    fn test_reject_mode_fails_replay() {
        let scenario = Scenario::from_json(
            r#"{
                "selection": { "totalPrice": 1000000, "currency": "VND" },
                "passengers": [{ "id": "adult-1", "type": "adult" }],
                "selectedServices": ["wifi"]
            }"#,
        )
        .unwrap();
        let rules = PricingRules {
            unknown_service: UnknownServiceMode::Reject,
            ..PricingRules::default()
        };
        assert!(matches!(replay(&scenario, &rules), Err(CliError::Core(_))));
    }

    #[test]
    fn test_report_serializes() {
        let scenario = Scenario::from_json(ADDONS_SCENARIO).unwrap();
        let report = replay(&scenario, &PricingRules::default()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["validation"]["calculatedTotal"], 1_766_000);
        assert_eq!(json["api"]["reconciliation"]["source"], "client");
    }
}
