//! # Domain Types
//!
//! Core domain types used throughout Forno POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │   Promotion     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  instance_id    │   │  kind           │       │
//! │  │  category       │   │  product_id     │◄──│  product_id_1   │       │
//! │  │  price_cents    │   │  unit_price     │   │  product_id_2?  │       │
//! │  └─────────────────┘   │  (snapshot)     │   │  discount (bps) │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderPayload   │   │  OrderLineItem  │   │  PendingOrder   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  customer_id    │   │  product_id     │   │  local_id       │       │
//! │  │  totals         │   │  quantity       │   │  status         │       │
//! │  │  payment_method │   │  unit_price     │   │  last_error     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// A discount share in basis points.
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. Fixed-price combos derive rates such as 10.71%,
/// which whole percentages cannot express. 10000 bps = 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// The whole amount (100%).
    pub const FULL: DiscountRate = DiscountRate(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from a whole percentage (50 = 50%).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        DiscountRate(percent * 100)
    }

    /// Derives the rate that turns `base` into `base - saving`.
    ///
    /// Rounded half-up to the nearest basis point. A non-positive base
    /// yields zero.
    pub fn from_saving(saving: Money, base: Money) -> Self {
        if !base.is_positive() || !saving.is_positive() {
            return DiscountRate::zero();
        }
        let base = base.cents() as i128;
        let bps = (saving.cents() as i128 * 10_000 + base / 2) / base;
        DiscountRate(bps.clamp(0, 10_000) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// Menu category of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// A whole pizza.
    Pizza,
    /// One half of a half-and-half pizza. Only sold combined with another half.
    Half,
    Beverage,
    Side,
    Dessert,
    /// A product sold as a bundle at a fixed price.
    Combo,
}

/// A product from the catalog.
///
/// The catalog is loaded by an external collaborator; the core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Backend identifier.
    pub id: String,

    /// Display name shown to the cashier and on the receipt.
    pub name: String,

    pub category: ProductCategory,

    /// Current catalog price in cents.
    pub price_cents: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Pinned to the quick-access grid.
    #[serde(default)]
    pub is_favorite: bool,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// A product can anchor a promotion when it is active and has a sane price.
    pub fn is_pricing_eligible(&self) -> bool {
        self.is_active && self.price_cents >= 0
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// The two halves behind a half-and-half cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompositeHalves {
    pub first_product_id: String,
    pub second_product_id: String,
    /// Concrete product referenced at checkout (the half that set the price).
    pub backing_product_id: String,
}

/// One unit of a product in the cart.
///
/// ## Snapshot Pattern
/// The price is frozen when the line is created. Fields are private and no
/// setter exists, so a catalog price change cannot reach lines already in
/// the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    instance_id: String,
    product_id: String,
    display_name: String,
    category: ProductCategory,
    unit_price_cents: i64,
    composite: Option<CompositeHalves>,
}

impl CartLine {
    /// Creates a line from a catalog product, freezing its current price.
    pub fn from_product(product: &Product) -> Self {
        CartLine {
            instance_id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            display_name: product.name.clone(),
            category: product.category,
            unit_price_cents: product.price_cents,
            composite: None,
        }
    }

    /// Creates a synthesized half-and-half line.
    pub(crate) fn from_halves(
        display_name: String,
        unit_price: Money,
        halves: CompositeHalves,
    ) -> Self {
        CartLine {
            instance_id: Uuid::new_v4().to_string(),
            product_id: format!(
                "half:{}+{}",
                halves.first_product_id, halves.second_product_id
            ),
            display_name,
            category: ProductCategory::Pizza,
            unit_price_cents: unit_price.cents(),
            composite: Some(halves),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    /// Returns the frozen unit price.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn composite(&self) -> Option<&CompositeHalves> {
        self.composite.as_ref()
    }

    pub fn is_composite(&self) -> bool {
        self.composite.is_some()
    }

    /// The product id sent to the backend. Composite lines reference their
    /// backing half because the synthesized id has no catalog row.
    pub fn checkout_product_id(&self) -> &str {
        match &self.composite {
            Some(halves) => &halves.backing_product_id,
            None => &self.product_id,
        }
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// Shape of a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Percentage off one product, or off a two-product pair.
    Percent,
    /// Two products sold together at a fixed price.
    FixedCombo,
    /// Two units of the same product for the price of one.
    TwoForOne,
}

/// How a promotion consumes cart lines. Derived from the kind and the
/// presence of a second product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule<'a> {
    /// One line of the product.
    Single(&'a str),
    /// One line of each product.
    Pair(&'a str, &'a str),
    /// Two distinct lines of the same product.
    TwoForOne(&'a str),
}

/// A named discount rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub kind: PromotionKind,
    pub product_id_1: String,
    pub product_id_2: Option<String>,
    /// Applied directly for Percent, derived for FixedCombo and TwoForOne.
    pub discount: DiscountRate,
    /// Price charged for a matched FixedCombo pair. The rate is display only
    /// when this is set.
    #[serde(default)]
    pub combo_price: Option<Money>,
}

impl Promotion {
    /// Percentage off one product.
    pub fn percent(
        id: impl Into<String>,
        name: impl Into<String>,
        product_id: impl Into<String>,
        discount: DiscountRate,
    ) -> Self {
        Promotion {
            id: id.into(),
            name: name.into(),
            kind: PromotionKind::Percent,
            product_id_1: product_id.into(),
            product_id_2: None,
            discount,
            combo_price: None,
        }
    }

    /// Percentage off a pair of different products.
    pub fn percent_pair(
        id: impl Into<String>,
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        discount: DiscountRate,
    ) -> Self {
        Promotion {
            id: id.into(),
            name: name.into(),
            kind: PromotionKind::Percent,
            product_id_1: first.into(),
            product_id_2: Some(second.into()),
            discount,
            combo_price: None,
        }
    }

    /// Two units of a product for the price of one (stored as 50%).
    pub fn two_for_one(
        id: impl Into<String>,
        name: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Promotion {
            id: id.into(),
            name: name.into(),
            kind: PromotionKind::TwoForOne,
            product_id_1: product_id.into(),
            product_id_2: None,
            discount: DiscountRate::from_percent(50),
            combo_price: None,
        }
    }

    /// Two products sold together for `combo_price`.
    ///
    /// The engine charges exactly `combo_price` for each matched pair. The
    /// stored rate is the saving relative to the current catalog prices, for
    /// display.
    ///
    /// ## Errors
    /// - same product twice
    /// - combo price negative or above the sum of both prices
    pub fn fixed_combo(
        id: impl Into<String>,
        name: impl Into<String>,
        first: &Product,
        second: &Product,
        combo_price: Money,
    ) -> CoreResult<Self> {
        let name = name.into();

        if first.id == second.id {
            return Err(CoreError::InvalidPromotion {
                name,
                reason: "combo products must differ".to_string(),
            });
        }

        let base = first.price() + second.price();
        if combo_price.is_negative() || combo_price > base {
            return Err(CoreError::InvalidPromotion {
                name,
                reason: format!("combo price {} must be between $0.00 and {}", combo_price, base),
            });
        }

        Ok(Promotion {
            id: id.into(),
            name,
            kind: PromotionKind::FixedCombo,
            product_id_1: first.id.clone(),
            product_id_2: Some(second.id.clone()),
            discount: DiscountRate::from_saving(base - combo_price, base),
            combo_price: Some(combo_price),
        })
    }

    /// Discount for one application over lines worth `base`.
    ///
    /// A combo whose lines are already at or below its price gives nothing.
    pub fn discount_on(&self, base: Money) -> Money {
        match (self.kind, self.combo_price) {
            (PromotionKind::FixedCombo, Some(price)) if base > price => base - price,
            (PromotionKind::FixedCombo, Some(_)) => Money::zero(),
            _ => base.percent_of(self.discount),
        }
    }

    /// Returns the matching rule. The kind is authoritative for 2-for-1;
    /// otherwise the second product decides between single and pair.
    pub fn rule(&self) -> MatchRule<'_> {
        match (self.kind, self.product_id_2.as_deref()) {
            (PromotionKind::TwoForOne, _) => MatchRule::TwoForOne(&self.product_id_1),
            (_, Some(second)) => MatchRule::Pair(&self.product_id_1, second),
            (_, None) => MatchRule::Single(&self.product_id_1),
        }
    }
}

// =============================================================================
// Pricing Output
// =============================================================================

/// One successful promotion match during a total computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub promotion_id: String,
    pub name: String,
    pub amount: Money,
}

/// Result of pricing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub total_discount: Money,
    /// `subtotal - total_discount`, not clamped.
    pub final_total: Money,
    /// In promotion-list order, then cart-line order.
    pub applied_discounts: Vec<AppliedDiscount>,
}

impl OrderTotals {
    /// Discounts exceeded the subtotal. The raw value is kept for audit.
    pub fn is_negative(&self) -> bool {
        self.final_total.is_negative()
    }
}

/// Receipt view of cart lines sharing a product id. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineGroup {
    pub product_id: String,
    pub display_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

// =============================================================================
// Orders
// =============================================================================

/// How the customer paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Transfer => write!(f, "transfer"),
        }
    }
}

/// Order header handed to the remote order boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPayload {
    pub tenant_id: String,
    pub customer_id: Option<String>,
    pub subtotal: Money,
    pub total_discount: Money,
    pub final_total: Money,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One order line as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineItem {
    pub product_id: String,
    pub quantity: i64,
    /// Price at the moment of the sale.
    pub unit_price: Money,
}

/// Ticket shown on the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Ticket {
    /// Sequence number assigned against the backend.
    Number(u32),
    /// Captured offline; the real number is assigned on drain.
    Offline,
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ticket::Number(n) => write!(f, "#{}", n),
            Ticket::Offline => write!(f, "OFFLINE"),
        }
    }
}

// =============================================================================
// Pending Orders (offline queue)
// =============================================================================

/// Sync state of an order captured offline.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PendingOrderStatus {
    /// Waiting for the next drain.
    Pending,
    /// A drain is submitting it right now.
    Syncing,
    /// Last attempt failed; held until explicitly requeued.
    Error,
}

impl Default for PendingOrderStatus {
    fn default() -> Self {
        PendingOrderStatus::Pending
    }
}

impl fmt::Display for PendingOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOrderStatus::Pending => write!(f, "pending"),
            PendingOrderStatus::Syncing => write!(f, "syncing"),
            PendingOrderStatus::Error => write!(f, "error"),
        }
    }
}

/// An order captured while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PendingOrder {
    /// Generated at capture time (UUID v4).
    pub local_id: String,
    pub payload: OrderPayload,
    pub line_items: Vec<OrderLineItem>,
    pub status: PendingOrderStatus,
    /// Set only when status is Error.
    pub last_error: Option<String>,
    /// Number of sync attempts so far.
    pub attempts: i64,
    /// Remote order id once the header was accepted. A retry with this set
    /// only submits the line items.
    pub remote_order_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
}

impl PendingOrder {
    /// Builds a fresh Pending record.
    pub fn new(payload: OrderPayload, line_items: Vec<OrderLineItem>) -> Self {
        PendingOrder {
            local_id: Uuid::new_v4().to_string(),
            payload,
            line_items,
            status: PendingOrderStatus::Pending,
            last_error: None,
            attempts: 0,
            remote_order_id: None,
            created_at: Utc::now(),
            attempted_at: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, category: ProductCategory, price_cents: i64) -> Product {
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
    fn test_discount_rate_from_percent() {
        let rate = DiscountRate::from_percent(20);
        assert_eq!(rate.bps(), 2000);
        assert!((rate.percentage() - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_discount_rate_from_saving() {
        // 3000 saved on 28000 = 10.714% → 1071 bps
        let rate = DiscountRate::from_saving(Money::from_cents(3000), Money::from_cents(28000));
        assert_eq!(rate.bps(), 1071);

        assert!(DiscountRate::from_saving(Money::from_cents(10), Money::zero()).is_zero());
    }

    #[test]
    fn test_cart_line_snapshots_price() {
        let mut pizza = product("p1", ProductCategory::Pizza, 22000);
        let line = CartLine::from_product(&pizza);

        pizza.price_cents = 30000;

        assert_eq!(line.unit_price().cents(), 22000);
        assert_eq!(line.checkout_product_id(), "p1");
        assert!(!line.is_composite());
    }

    #[test]
    fn test_cart_lines_get_distinct_instance_ids() {
        let soda = product("s1", ProductCategory::Beverage, 500);
        let a = CartLine::from_product(&soda);
        let b = CartLine::from_product(&soda);
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[test]
    fn test_promotion_rules() {
        let single = Promotion::percent("1", "Tuesday", "p1", DiscountRate::from_percent(20));
        assert_eq!(single.rule(), MatchRule::Single("p1"));

        let pair = Promotion::percent_pair("2", "Pizza+Soda", "p1", "s1", DiscountRate::from_percent(10));
        assert_eq!(pair.rule(), MatchRule::Pair("p1", "s1"));

        let deal = Promotion::two_for_one("3", "Happy hour", "b1");
        assert_eq!(deal.rule(), MatchRule::TwoForOne("b1"));
        assert_eq!(deal.discount.bps(), 5000);
    }

    #[test]
    fn test_fixed_combo_derives_rate() {
        let pizza = product("p1", ProductCategory::Pizza, 22000);
        let soda = product("s1", ProductCategory::Beverage, 6000);

        let combo = Promotion::fixed_combo("c1", "Combo", &pizza, &soda, Money::from_cents(25000)).unwrap();
        assert_eq!(combo.kind, PromotionKind::FixedCombo);
        assert_eq!(combo.rule(), MatchRule::Pair("p1", "s1"));
        assert_eq!(combo.discount.bps(), 1071);
        assert_eq!(combo.combo_price, Some(Money::from_cents(25000)));

        // Charges the combo price, not the rounded rate
        let totals = crate::pricing::compute_totals(
            &[CartLine::from_product(&pizza), CartLine::from_product(&soda)],
            &[combo],
        );
        assert_eq!(totals.total_discount, Money::from_cents(3000));
        assert_eq!(totals.final_total, Money::from_cents(25000));
    }

    #[test]
    fn test_combo_discount_follows_frozen_prices() {
        let pizza = product("p1", ProductCategory::Pizza, 22000);
        let soda = product("s1", ProductCategory::Beverage, 6000);
        let combo = Promotion::fixed_combo("c1", "Combo", &pizza, &soda, Money::from_cents(25000)).unwrap();

        assert_eq!(combo.discount_on(Money::from_cents(30000)), Money::from_cents(5000));
        assert_eq!(combo.discount_on(Money::from_cents(24000)), Money::zero());

        let percent = Promotion::percent("p", "Tuesday", "p1", DiscountRate::from_percent(20));
        assert_eq!(percent.discount_on(Money::from_cents(22000)), Money::from_cents(4400));
    }

    #[test]
    fn test_fixed_combo_rejects_bad_price() {
        let pizza = product("p1", ProductCategory::Pizza, 22000);
        let soda = product("s1", ProductCategory::Beverage, 6000);

        assert!(Promotion::fixed_combo("c1", "Combo", &pizza, &soda, Money::from_cents(30000)).is_err());
        assert!(Promotion::fixed_combo("c1", "Combo", &pizza, &soda, Money::from_cents(-1)).is_err());
        assert!(Promotion::fixed_combo("c1", "Combo", &pizza, &pizza, Money::from_cents(100)).is_err());
    }

    #[test]
    fn test_ticket_display() {
        assert_eq!(Ticket::Number(12).to_string(), "#12");
        assert_eq!(Ticket::Offline.to_string(), "OFFLINE");
    }

    #[test]
    fn test_pending_order_starts_pending() {
        let payload = OrderPayload {
            tenant_id: "t1".to_string(),
            customer_id: None,
            subtotal: Money::from_cents(1000),
            total_discount: Money::zero(),
            final_total: Money::from_cents(1000),
            payment_method: PaymentMethod::Cash,
            created_at: Utc::now(),
        };
        let order = PendingOrder::new(payload, Vec::new());
        assert_eq!(order.status, PendingOrderStatus::Pending);
        assert!(order.last_error.is_none());
        assert_eq!(order.attempts, 0);
    }
}
