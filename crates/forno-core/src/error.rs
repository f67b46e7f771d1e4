//! # Error Types
//!
//! Domain-specific error types for forno-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  forno-core errors (this file)                                          │
//! │  ├── CoreError        - Cart and promotion rule violations              │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  forno-db errors (separate crate)                                       │
//! │  └── DbError          - Pending-order store failures                    │
//! │                                                                         │
//! │  forno-sync errors (separate crate)                                     │
//! │  ├── RemoteError      - Remote order boundary failures (per record)     │
//! │  └── SyncError        - Queue and checkout failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing itself never fails; these errors come from building carts and
//! promotions.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is inactive.
    #[error("Product is not available: {0}")]
    ProductInactive(String),

    /// Half-and-half requires two products of the Half category.
    ///
    /// ## When This Occurs
    /// ```text
    /// add_half_and_half(margherita_half, cola)
    ///      │
    ///      ▼
    /// cola.category == Beverage
    ///      │
    ///      ▼
    /// NotHalfProduct("cola")
    /// ```
    #[error("Product {0} cannot be sold as a half")]
    NotHalfProduct(String),

    /// No cart line with this instance id.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout of an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Promotion violates a structural rule.
    #[error("Invalid promotion '{name}': {reason}")]
    InvalidPromotion { name: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must differ are equal.
    #[error("{field} must differ from {other}")]
    MustDiffer { field: String, other: String },

    /// Field must be empty for this kind of record.
    #[error("{field} is not allowed for {context}")]
    NotAllowed { field: String, context: String },
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
    fn test_error_messages() {
        let err = CoreError::NotHalfProduct("cola".to_string());
        assert_eq!(err.to_string(), "Product cola cannot be sold as a half");

        let err = CoreError::CartTooLarge { max: 100 };
        assert_eq!(err.to_string(), "Cart cannot have more than 100 items");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustDiffer {
            field: "product_id_2".to_string(),
            other: "product_id_1".to_string(),
        };
        assert_eq!(err.to_string(), "product_id_2 must differ from product_id_1");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
