//! # Catalog
//!
//! In-memory view of the products and promotions the POS prices against.
//!
//! The catalog is loaded by an external collaborator (the hosted backend)
//! and handed to the core. Promotions are kept in priority order: the
//! pricing engine applies them exactly in the order stored here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, ProductCategory, Promotion};
use crate::validation::validate_promotion;

/// Products and promotions available to the terminal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Catalog {
    products: Vec<Product>,
    promotions: Vec<Promotion>,
}

impl Catalog {
    /// Creates a catalog with no promotions.
    pub fn new(products: Vec<Product>) -> Self {
        Catalog {
            products,
            promotions: Vec::new(),
        }
    }

    /// Creates a catalog, validating every promotion against the products.
    pub fn with_promotions(products: Vec<Product>, promotions: Vec<Promotion>) -> CoreResult<Self> {
        let mut catalog = Catalog::new(products);
        for promotion in promotions {
            catalog.add_promotion(promotion)?;
        }
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Active products only, in catalog order.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_active)
    }

    /// Active products of one category (e.g. the halves picker).
    pub fn by_category(&self, category: ProductCategory) -> impl Iterator<Item = &Product> {
        self.active_products().filter(move |p| p.category == category)
    }

    /// Active products pinned to the quick-access grid.
    pub fn favorites(&self) -> impl Iterator<Item = &Product> {
        self.active_products().filter(|p| p.is_favorite)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    /// Looks up a product that can be sold right now.
    pub fn sellable(&self, id: &str) -> CoreResult<&Product> {
        let product = self
            .product(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        if !product.is_active {
            return Err(CoreError::ProductInactive(id.to_string()));
        }
        Ok(product)
    }

    /// Promotions in priority order.
    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    /// Appends a promotion at the lowest priority after validating it.
    pub fn add_promotion(&mut self, promotion: Promotion) -> CoreResult<()> {
        validate_promotion(&promotion, |id| self.product(id))?;
        self.promotions.push(promotion);
        Ok(())
    }

    /// Removes a promotion by id. Returns it if present.
    pub fn remove_promotion(&mut self, id: &str) -> Option<Promotion> {
        let index = self.promotions.iter().position(|p| p.id == id)?;
        Some(self.promotions.remove(index))
    }
}
