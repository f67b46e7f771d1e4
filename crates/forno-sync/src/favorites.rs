//! Favorite toggling with optimistic update.
//!
//! The star flips in the local catalog right away; if the backend refuses
//! the change it flips back.

use std::time::Duration;

use tracing::{debug, warn};

use forno_core::{Catalog, CoreError, Optimistic};

use crate::backend::{bounded, CatalogBackend};
use crate::error::SyncResult;

/// Flips `is_favorite` on a product. Returns the new value.
pub async fn toggle_favorite(
    catalog: &mut Catalog,
    product_id: &str,
    backend: &dyn CatalogBackend,
    limit: Duration,
) -> SyncResult<bool> {
    let product = catalog
        .product_mut(product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    let change = Optimistic::apply(&mut product.is_favorite, |f| *f = !*f);
    let wanted = product.is_favorite;

    match bounded(limit, backend.set_favorite(product_id, wanted)).await {
        Ok(()) => {
            change.commit();
            debug!(product_id, is_favorite = wanted, "Favorite updated");
            Ok(wanted)
        }
        Err(e) => {
            warn!(product_id, error = %e, "Favorite update refused, reverting");
            // Found above; the exclusive borrow keeps it there
            if let Some(product) = catalog.product_mut(product_id) {
                change.rollback(&mut product.is_favorite);
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MemoryBackend;
    use crate::error::{RemoteError, SyncError};
    use forno_core::{Product, ProductCategory};

    fn catalog() -> Catalog {
        Catalog::new(vec![Product {
            id: "margherita".to_string(),
            name: "Margherita".to_string(),
            category: ProductCategory::Pizza,
            price_cents: 18000,
            is_active: true,
            is_favorite: false,
        }])
    }

    const LIMIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_toggle_commits() {
        let backend = MemoryBackend::new();
        let mut catalog = catalog();

        assert!(toggle_favorite(&mut catalog, "margherita", backend.as_ref(), LIMIT).await.unwrap());
        assert!(catalog.product("margherita").unwrap().is_favorite);
        assert_eq!(catalog.favorites().count(), 1);

        assert!(!toggle_favorite(&mut catalog, "margherita", backend.as_ref(), LIMIT).await.unwrap());
        assert_eq!(
            *backend.favorites.lock().unwrap(),
            vec![("margherita".to_string(), true), ("margherita".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_toggle_rolls_back_on_failure() {
        let backend = MemoryBackend::new();
        backend.fail_next_favorite(RemoteError::from_status(403, "forbidden"));
        let mut catalog = catalog();

        let result = toggle_favorite(&mut catalog, "margherita", backend.as_ref(), LIMIT).await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert!(!catalog.product("margherita").unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_unknown_product() {
        let backend = MemoryBackend::new();
        let mut catalog = catalog();

        let result = toggle_favorite(&mut catalog, "calzone", backend.as_ref(), LIMIT).await;
        assert!(matches!(result, Err(SyncError::Core(CoreError::ProductNotFound(_)))));
    }
}
