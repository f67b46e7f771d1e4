//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A 2-for-1 on two 4.995 pizzas computed in floats:                      │
//! │    (4.995 + 4.995) * 0.5 = 4.994999999999999  ❌ WRONG!                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    (499 + 499) * 5000 bps / 10000 = 499 cents                           │
//! │    Rounding happens once, explicitly, half-up                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forno_core::money::Money;
//! use forno_core::types::DiscountRate;
//!
//! let pizza = Money::from_cents(2200);
//! let soda = Money::from_cents(500);
//!
//! let pair = pizza + soda;
//! assert_eq!(pair.cents(), 2700);
//!
//! // 20% of the pair, rounded half-up on minor units
//! assert_eq!(pair.percent_of(DiscountRate::from_percent(20)).cents(), 540);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: an order total may legitimately go below zero when
///   discounts exceed the subtotal; the sign is preserved for auditing
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartLine.unit_price (snapshot) ──► OrderTotals.subtotal
///                                                          │
///                        AppliedDiscount.amount ───────────┤
///                                                          ▼
///                                               OrderTotals.final_total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the given share of this amount, rounded half-up on minor units.
    ///
    /// ## Implementation
    /// Integer math only: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides the rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::Money;
    /// use forno_core::types::DiscountRate;
    ///
    /// // 2-for-1 on two 10.00 beers: 50% of 20.00
    /// let pair = Money::from_cents(2000);
    /// assert_eq!(pair.percent_of(DiscountRate::from_percent(50)).cents(), 1000);
    ///
    /// // 12.5% of 0.99 = 0.12375 → 0.12
    /// let small = Money::from_cents(99);
    /// assert_eq!(small.percent_of(DiscountRate::from_bps(1250)).cents(), 12);
    /// ```
    pub fn percent_of(&self, rate: DiscountRate) -> Money {
        // i128 prevents overflow on large amounts
        let share = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(share as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display. Receipts format money in the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Summing an iterator of Money (subtotals, discount totals).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b - a).cents(), -500);
    }

    #[test]
    fn test_sum() {
        let prices = [Money::from_cents(100), Money::from_cents(250)];
        let total: Money = prices.iter().sum();
        assert_eq!(total.cents(), 350);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 15% of 0.10 = 0.015 → 0.02
        assert_eq!(
            Money::from_cents(10)
                .percent_of(DiscountRate::from_percent(15))
                .cents(),
            2
        );
        // 100% keeps the full amount, 0% yields zero
        let price = Money::from_cents(1234);
        assert_eq!(price.percent_of(DiscountRate::from_percent(100)), price);
        assert!(price.percent_of(DiscountRate::zero()).is_zero());
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let huge = Money::from_cents(i64::MAX / 2);
        let half = huge.percent_of(DiscountRate::from_percent(50));
        assert!(half.is_positive());
    }
}
