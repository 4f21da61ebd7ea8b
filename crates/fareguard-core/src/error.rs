//! # Error Types
//!
//! Domain-specific error types for fareguard-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fareguard-core errors (this file)                                      │
//! │  ├── CoreError           - General domain errors                        │
//! │  ├── ValidationError     - Input shape failures (party size, currency)  │
//! │  └── CatalogLookupError  - Service id missing from the addon catalog    │
//! │                                                                         │
//! │  fareguard-cli errors (app crate)                                       │
//! │  └── CliError            - Config / scenario file failures              │
//! │                                                                         │
//! │  NOT errors: price mismatches, negative sub-totals, unusual totals.     │
//! │  Those are collected in ValidationResult.errors / .warnings so the      │
//! │  booking UI can show every problem at once.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// Reserved for programmer errors and misconfiguration. Business rule
/// violations on a booking never surface as `CoreError`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pricing rules failed their own consistency checks.
    #[error("Invalid pricing rules: {0}")]
    InvalidRules(String),

    /// Service catalog could not be built.
    #[error("Invalid service catalog: {0}")]
    InvalidCatalog(String),

    /// A selected service id could not be priced and the policy rejects it.
    #[error(transparent)]
    Catalog(#[from] CatalogLookupError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Catalog Lookup Error
// =============================================================================

/// Failure to price a selected service addon.
///
/// Lookups never fall back on their own. The calculator decides, based on
/// [`crate::calculator::UnknownServicePolicy`], whether to charge a fallback
/// price or hand this error back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogLookupError {
    #[error("Service addon '{0}' is not in the catalog")]
    UnknownService(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller-supplied records are malformed in a way the
/// type system cannot express (an unknown currency code, an infant with no
/// adult to sit on).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., lower-case currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate service id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_message() {
        let err = CatalogLookupError::UnknownService("wifi".to_string());
        assert_eq!(err.to_string(), "Service addon 'wifi' is not in the catalog");

        let core: CoreError = err.into();
        assert_eq!(core.to_string(), "Service addon 'wifi' is not in the catalog");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "currency".to_string(),
        };
        assert_eq!(err.to_string(), "currency is required");

        let err = ValidationError::OutOfRange {
            field: "adults".to_string(),
            min: 1,
            max: 9,
        };
        assert_eq!(err.to_string(), "adults must be between 1 and 9");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Duplicate {
            field: "service id".to_string(),
            value: "meal".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
