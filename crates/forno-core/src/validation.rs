//! # Validation Module
//!
//! Input validation for Forno POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend                                                      │
//! │  └── Immediate user feedback (empty fields, lengths)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Promotions rejected at creation, never at pricing time             │
//! │  └── Cart size, prices, ids                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  └── NOT NULL / UNIQUE / CHECK constraints on pending orders            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forno_core::types::DiscountRate;
//! use forno_core::validation::{validate_discount_rate, validate_price_cents};
//!
//! assert!(validate_price_cents(2200).is_ok());
//! assert!(validate_discount_rate(DiscountRate::from_bps(10_001)).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{DiscountRate, Product, Promotion, PromotionKind};
use crate::MAX_CART_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or promotion name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a UUID string (local order ids).
///
/// ## Example
/// ```rust
/// use forno_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount rate: 0% to 100%.
pub fn validate_discount_rate(rate: DiscountRate) -> ValidationResult<()> {
    if rate > DiscountRate::FULL {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: DiscountRate::FULL.bps() as i64,
        });
    }

    Ok(())
}

/// Validates cart size before adding a line.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Promotion Validation
// =============================================================================

/// Validates a promotion against the catalog before it is stored.
///
/// ## Rules
/// ```text
/// name             non-empty
/// discount         0..=100%
/// product_id_1     exists, active, price >= 0
/// product_id_2     absent for TwoForOne
///                  otherwise (if present) != product_id_1, exists, active
/// FixedCombo       requires product_id_2
/// ```
///
/// The engine itself never rejects anything; a promotion that slips through
/// would only ever fail to match.
pub fn validate_promotion<'a, F>(promotion: &Promotion, lookup: F) -> CoreResult<()>
where
    F: Fn(&str) -> Option<&'a Product>,
{
    validate_name("name", &promotion.name)?;
    validate_discount_rate(promotion.discount)?;

    let check_product = |id: &str| -> CoreResult<()> {
        let product = lookup(id).ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        if !product.is_pricing_eligible() {
            return Err(CoreError::ProductInactive(id.to_string()));
        }
        Ok(())
    };

    check_product(&promotion.product_id_1)?;

    match (promotion.kind, promotion.product_id_2.as_deref()) {
        (PromotionKind::TwoForOne, Some(_)) => Err(ValidationError::NotAllowed {
            field: "product_id_2".to_string(),
            context: "a 2-for-1 promotion".to_string(),
        }
        .into()),
        (PromotionKind::FixedCombo, None) => Err(ValidationError::Required {
            field: "product_id_2".to_string(),
        }
        .into()),
        (_, Some(second)) if second == promotion.product_id_1 => Err(ValidationError::MustDiffer {
            field: "product_id_2".to_string(),
            other: "product_id_1".to_string(),
        }
        .into()),
        (_, Some(second)) => check_product(second),
        (_, None) => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductCategory;

    fn products() -> Vec<Product> {
        let make = |id: &str, price_cents: i64, is_active: bool| Product {
            id: id.to_string(),
            name: id.to_string(),
            category: ProductCategory::Pizza,
            price_cents,
            is_active,
            is_favorite: false,
        };
        vec![
            make("a", 2000, true),
            make("b", 500, true),
            make("off", 900, false),
            make("corrupt", -100, true),
        ]
    }

    fn check(promotion: &Promotion) -> CoreResult<()> {
        let products = products();
        validate_promotion(promotion, |id| products.iter().find(|p| p.id == id))
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Tuesday pizza").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_discount_rate() {
        assert!(validate_discount_rate(DiscountRate::zero()).is_ok());
        assert!(validate_discount_rate(DiscountRate::FULL).is_ok());
        assert!(validate_discount_rate(DiscountRate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }

    #[test]
    fn test_valid_promotions() {
        assert!(check(&Promotion::percent("1", "a off", "a", DiscountRate::from_percent(10))).is_ok());
        assert!(check(&Promotion::two_for_one("2", "2x1 b", "b")).is_ok());
        assert!(check(&Promotion::percent_pair("3", "a+b", "a", "b", DiscountRate::from_percent(5))).is_ok());
    }

    #[test]
    fn test_rejects_unknown_or_ineligible_products() {
        let missing = Promotion::percent("1", "ghost", "zzz", DiscountRate::from_percent(10));
        assert!(matches!(check(&missing), Err(CoreError::ProductNotFound(_))));

        let inactive = Promotion::two_for_one("2", "old", "off");
        assert!(matches!(check(&inactive), Err(CoreError::ProductInactive(_))));

        let corrupt = Promotion::percent_pair("3", "bad", "a", "corrupt", DiscountRate::from_percent(10));
        assert!(matches!(check(&corrupt), Err(CoreError::ProductInactive(_))));
    }

    #[test]
    fn test_rejects_structural_errors() {
        let same = Promotion::percent_pair("1", "a+a", "a", "a", DiscountRate::from_percent(10));
        assert!(matches!(check(&same), Err(CoreError::Validation(ValidationError::MustDiffer { .. }))));

        let mut two_for_one = Promotion::two_for_one("2", "2x1", "a");
        two_for_one.product_id_2 = Some("b".to_string());
        assert!(matches!(check(&two_for_one), Err(CoreError::Validation(ValidationError::NotAllowed { .. }))));

        let too_much = Promotion::percent("3", "free+", "a", DiscountRate::from_bps(12_000));
        assert!(check(&too_much).is_err());

        let unnamed = Promotion::percent("4", " ", "a", DiscountRate::from_percent(10));
        assert!(check(&unnamed).is_err());
    }
}
