//! # Pricing Engine
//!
//! Half-and-half pricing and the promotion engine.
//!
//! ## How a Cart Is Priced
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      compute_totals(cart, promotions)                   │
//! │                                                                         │
//! │  cart (untouched) ──────────────────────────────► subtotal              │
//! │       │                                                                 │
//! │       │ clone                                                           │
//! │       ▼                                                                 │
//! │  working copy ◄──┐                                                      │
//! │       │          │ matched lines removed                                │
//! │       ▼          │                                                      │
//! │  for promotion in promotions (caller order):                            │
//! │      match ──────┘ ──► AppliedDiscount { amount }                       │
//! │      repeat until no match (Single: once, cap 50)                       │
//! │                                                                         │
//! │  final_total = subtotal - Σ amounts   (not clamped)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A physical cart line satisfies at most one promotion application. Three
//! beers under a 2-for-1 yield one discount and one leftover beer.
//!
//! Everything here is pure: same input, same output, no failure modes.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    AppliedDiscount, CartLine, CompositeHalves, LineGroup, MatchRule, OrderTotals, Product,
    ProductCategory, Promotion,
};

/// Upper bound on applications of one promotion in one computation.
///
/// Carts are bounded by a human order, so this never binds on sane data. It
/// guarantees termination when promotion data is duplicated or malformed.
pub const MAX_APPLICATIONS_PER_PROMOTION: usize = 50;

// =============================================================================
// Half-and-Half
// =============================================================================

/// Price of a pizza made of two halves: the more expensive half wins.
///
/// A negative input means corrupt catalog data, so the result is exactly
/// zero rather than a negative price.
///
/// ## Example
/// ```rust
/// use forno_core::money::Money;
/// use forno_core::pricing::resolve_half_price;
///
/// let price = resolve_half_price(Money::from_cents(17000), Money::from_cents(22000));
/// assert_eq!(price.cents(), 22000);
///
/// let broken = resolve_half_price(Money::from_cents(-5000), Money::from_cents(10000));
/// assert!(broken.is_zero());
/// ```
pub fn resolve_half_price(a: Money, b: Money) -> Money {
    if a.is_negative() || b.is_negative() {
        return Money::zero();
    }
    a.max(b)
}

/// Synthesizes the cart line for a half-and-half pizza.
///
/// The backing product (referenced at checkout) is the half that set the
/// price, the first one on a tie.
pub fn half_and_half_line(first: &Product, second: &Product) -> CoreResult<CartLine> {
    for half in [first, second] {
        if half.category != ProductCategory::Half {
            return Err(CoreError::NotHalfProduct(half.id.clone()));
        }
        if !half.is_active {
            return Err(CoreError::ProductInactive(half.id.clone()));
        }
    }

    let backing = if second.price() > first.price() {
        second
    } else {
        first
    };

    Ok(CartLine::from_halves(
        format!("½ {} + ½ {}", first.name, second.name),
        resolve_half_price(first.price(), second.price()),
        CompositeHalves {
            first_product_id: first.id.clone(),
            second_product_id: second.id.clone(),
            backing_product_id: backing.id.clone(),
        },
    ))
}

// =============================================================================
// Promotion Engine
// =============================================================================

/// Prices a cart against an ordered list of promotions.
///
/// ## Algorithm
/// 1. Subtotal from the untouched cart
/// 2. Each promotion, in the order given, consumes lines from a working copy
/// 3. Each match records an [`AppliedDiscount`] of `base * rate`, rounded
///    half-up on minor units
///
/// Promotions referencing products absent from the cart simply never match.
///
/// ## Example
/// ```rust
/// use forno_core::pricing::compute_totals;
/// use forno_core::types::{CartLine, Product, ProductCategory, Promotion};
///
/// let beer = Product {
///     id: "beer".into(),
///     name: "Beer".into(),
///     category: ProductCategory::Beverage,
///     price_cents: 1000,
///     is_active: true,
///     is_favorite: false,
/// };
/// let cart = vec![CartLine::from_product(&beer), CartLine::from_product(&beer)];
/// let promos = vec![Promotion::two_for_one("p1", "2x1 beer", "beer")];
///
/// let totals = compute_totals(&cart, &promos);
/// assert_eq!(totals.subtotal.cents(), 2000);
/// assert_eq!(totals.final_total.cents(), 1000);
/// ```
pub fn compute_totals(cart: &[CartLine], promotions: &[Promotion]) -> OrderTotals {
    let subtotal: Money = cart.iter().map(CartLine::unit_price).sum();

    let mut working: Vec<&CartLine> = cart.iter().collect();
    let mut applied_discounts = Vec::new();

    for promotion in promotions {
        let rule = promotion.rule();
        let cap = match rule {
            MatchRule::Single(_) => 1,
            _ => MAX_APPLICATIONS_PER_PROMOTION,
        };

        for _ in 0..cap {
            let Some(base) = take_match(&mut working, rule) else {
                break;
            };
            applied_discounts.push(AppliedDiscount {
                promotion_id: promotion.id.clone(),
                name: promotion.name.clone(),
                amount: promotion.discount_on(base),
            });
        }
    }

    let total_discount: Money = applied_discounts.iter().map(|d| d.amount).sum();

    OrderTotals {
        subtotal,
        total_discount,
        final_total: subtotal - total_discount,
        applied_discounts,
    }
}

/// Removes the lines one application of `rule` consumes from the working
/// copy and returns their combined price. Leaves the copy untouched when the
/// rule does not fully match.
fn take_match(working: &mut Vec<&CartLine>, rule: MatchRule<'_>) -> Option<Money> {
    fn position(working: &[&CartLine], product_id: &str, skip: Option<usize>) -> Option<usize> {
        working
            .iter()
            .enumerate()
            .position(|(i, line)| Some(i) != skip && line.product_id() == product_id)
    }

    let (first, second) = match rule {
        MatchRule::Single(product_id) => {
            let i = position(working, product_id, None)?;
            return Some(working.remove(i).unit_price());
        }
        MatchRule::Pair(first_id, second_id) => {
            let i = position(working, first_id, None)?;
            let j = position(working, second_id, Some(i))?;
            (i, j)
        }
        MatchRule::TwoForOne(product_id) => {
            let i = position(working, product_id, None)?;
            let j = position(working, product_id, Some(i))?;
            (i, j)
        }
    };

    // Remove the higher index first so the lower one stays valid.
    let (low, high) = if first < second {
        (first, second)
    } else {
        (second, first)
    };
    let high_line = working.remove(high);
    let low_line = working.remove(low);
    Some(low_line.unit_price() + high_line.unit_price())
}

// =============================================================================
// Receipt Grouping
// =============================================================================

/// Groups cart lines by product id for the receipt, in first-appearance
/// order. Display only; discounts are always computed per line.
pub fn group_lines(cart: &[CartLine]) -> Vec<LineGroup> {
    let mut groups: Vec<LineGroup> = Vec::new();

    for line in cart {
        match groups.iter_mut().find(|g| g.product_id == line.product_id()) {
            Some(group) => {
                group.quantity += 1;
                group.line_total += line.unit_price();
            }
            None => groups.push(LineGroup {
                product_id: line.product_id().to_string(),
                display_name: line.display_name().to_string(),
                unit_price: line.unit_price(),
                quantity: 1,
                line_total: line.unit_price(),
            }),
        }
    }

    groups
}

// =============================================================================
// Unit Tests
// =============================================================================
