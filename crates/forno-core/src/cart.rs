//! # Cart
//!
//! The order in progress: an ordered list of cart lines, one per
//! add-to-cart event.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Cart Method              State Change         │
//! │  ──────────────           ───────────              ────────────         │
//! │                                                                         │
//! │  Tap product ────────────► add_product() ────────► lines.push(line)     │
//! │                                                                         │
//! │  Pick two halves ────────► add_half_and_half() ──► lines.push(line)     │
//! │                                                                         │
//! │  Swipe line ─────────────► remove_line() ────────► lines.remove(i)      │
//! │                                                                         │
//! │  Any of the above ───────► totals() ─────────────► (recomputed, pure)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a grocery cart there is no quantity field. Two pizzas are two
//! lines, each with its own instance id and frozen price, because a
//! promotion may consume one and not the other.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{compute_totals, group_lines, half_and_half_line};
use crate::types::{CartLine, LineGroup, OrderTotals, Product, Promotion};
use crate::validation::validate_cart_size;
use crate::MAX_CART_LINES;

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `instance_id`, never by product
/// - Line prices never change after insertion
/// - At most [`MAX_CART_LINES`] lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of a product, freezing its current price.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<&CartLine> {
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.id.clone()));
        }
        self.push(CartLine::from_product(product))
    }

    /// Adds one unit of a catalog product by id.
    pub fn add_from_catalog(&mut self, catalog: &Catalog, product_id: &str) -> CoreResult<&CartLine> {
        let product = catalog.sellable(product_id)?;
        self.push(CartLine::from_product(product))
    }

    /// Adds a half-and-half pizza priced by its more expensive half.
    pub fn add_half_and_half(&mut self, first: &Product, second: &Product) -> CoreResult<&CartLine> {
        let line = half_and_half_line(first, second)?;
        self.push(line)
    }

    fn push(&mut self, line: CartLine) -> CoreResult<&CartLine> {
        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        })?;
        self.lines.push(line);
        let index = self.lines.len() - 1;
        Ok(&self.lines[index])
    }

    /// Removes a line by instance id.
    pub fn remove_line(&mut self, instance_id: &str) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.instance_id() == instance_id)
            .ok_or_else(|| CoreError::LineNotFound(instance_id.to_string()))?;
        Ok(self.lines.remove(index))
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line prices before discounts.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::unit_price).sum()
    }

    /// Prices the cart. Called after every mutation; nothing is cached.
    pub fn totals(&self, promotions: &[Promotion]) -> OrderTotals {
        compute_totals(&self.lines, promotions)
    }

    /// Receipt view grouped by product.
    pub fn groups(&self) -> Vec<LineGroup> {
        group_lines(&self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscountRate, ProductCategory};

    fn test_product(id: &str, category: ProductCategory, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category,
            price_cents,
            is_active: true,
            is_favorite: false,
        }
    }

    #[test]
    fn test_cart_add_product() {
        let mut cart = Cart::new();
        let pizza = test_product("1", ProductCategory::Pizza, 2200);

        cart.add_product(&pizza).unwrap();
        cart.add_product(&pizza).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal().cents(), 4400);
        assert_eq!(cart.groups()[0].quantity, 2);
    }

    #[test]
    fn test_cart_price_frozen_after_catalog_change() {
        let mut catalog = Catalog::new(vec![test_product("1", ProductCategory::Pizza, 2200)]);
        let mut cart = Cart::new();

        cart.add_from_catalog(&catalog, "1").unwrap();
        catalog.product_mut("1").unwrap().price_cents = 9900;
        cart.add_from_catalog(&catalog, "1").unwrap();

        assert_eq!(cart.lines()[0].unit_price().cents(), 2200);
        assert_eq!(cart.lines()[1].unit_price().cents(), 9900);
    }

    #[test]
    fn test_cart_rejects_inactive_product() {
        let mut cart = Cart::new();
        let mut pizza = test_product("1", ProductCategory::Pizza, 2200);
        pizza.is_active = false;

        assert!(matches!(cart.add_product(&pizza), Err(CoreError::ProductInactive(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_half_and_half() {
        let mut cart = Cart::new();
        let a = test_product("a", ProductCategory::Half, 17000);
        let b = test_product("b", ProductCategory::Half, 22000);

        let line = cart.add_half_and_half(&a, &b).unwrap();
        assert!(line.is_composite());
        assert_eq!(cart.subtotal().cents(), 22000);
    }

    #[test]
    fn test_cart_remove_line() {
        let mut cart = Cart::new();
        let soda = test_product("s", ProductCategory::Beverage, 500);

        let first = cart.add_product(&soda).unwrap().instance_id().to_string();
        cart.add_product(&soda).unwrap();

        let removed = cart.remove_line(&first).unwrap();
        assert_eq!(removed.instance_id(), first);
        assert_eq!(cart.len(), 1);

        assert!(matches!(cart.remove_line(&first), Err(CoreError::LineNotFound(_))));
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        let soda = test_product("s", ProductCategory::Beverage, 500);

        for _ in 0..MAX_CART_LINES {
            cart.add_product(&soda).unwrap();
        }

        assert!(matches!(cart.add_product(&soda), Err(CoreError::CartTooLarge { .. })));
    }

    #[test]
    fn test_cart_totals_recompute_after_removal() {
        let mut cart = Cart::new();
        let beer = test_product("beer", ProductCategory::Beverage, 1000);
        let promos = vec![Promotion::two_for_one("p", "2x1", "beer")];

        cart.add_product(&beer).unwrap();
        let second = cart.add_product(&beer).unwrap().instance_id().to_string();
        assert_eq!(cart.totals(&promos).final_total.cents(), 1000);

        cart.remove_line(&second).unwrap();
        assert_eq!(cart.totals(&promos).final_total.cents(), 1000);
        assert!(cart.totals(&promos).applied_discounts.is_empty());

        let promos = vec![Promotion::percent("q", "10%", "beer", DiscountRate::from_percent(10))];
        assert_eq!(cart.totals(&promos).final_total.cents(), 900);
    }

    #[test]
    fn test_cart_clear() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", ProductCategory::Side, 999)).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
