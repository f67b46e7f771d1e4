//! # forno-core: Pure Business Logic for Forno POS
//!
//! This crate is the **heart** of Forno POS. It prices pizzeria orders with
//! pure functions and zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Forno POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (POS screens)                       │   │
//! │  │    Menu grid ──► Cart ──► Payment ──► Receipt (ticket #)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ forno-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │ half/half │  │ CartLine  │  │ promotion │  │   │
//! │  │   │ Promotion │  │  promos   │  │  totals   │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      forno-db (pending orders) + forno-sync (offline queue)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartLine, Promotion, PendingOrder, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Half-and-half rule and the promotion engine
//! - [`cart`] - The order in progress
//! - [`catalog`] - Products and promotions in priority order
//! - [`optimistic`] - Local change with snapshot rollback
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use forno_core::cart::Cart;
//! use forno_core::types::{Product, ProductCategory, Promotion};
//!
//! let half = |id: &str, price_cents| Product {
//!     id: id.to_string(),
//!     name: id.to_string(),
//!     category: ProductCategory::Half,
//!     price_cents,
//!     is_active: true,
//!     is_favorite: false,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_half_and_half(&half("margherita", 17000), &half("pepperoni", 22000)).unwrap();
//!
//! let totals = cart.totals(&[Promotion::two_for_one("p1", "2x1", "pepperoni")]);
//! assert_eq!(totals.final_total.cents(), 22000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod optimistic;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use optimistic::Optimistic;
pub use pricing::{compute_totals, group_lines, resolve_half_price, MAX_APPLICATIONS_PER_PROMOTION};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// Bounds the promotion engine's work; a pizzeria order never gets close.
pub const MAX_CART_LINES: usize = 100;
