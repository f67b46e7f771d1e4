//! # Remote Boundaries
//!
//! The hosted backend as seen by checkout, the queue and the catalog.
//!
//! ```text
//! ┌──────────────┐  count_orders_since   ┌──────────────────────┐
//! │  Checkout    │──────────────────────►│                      │
//! │  OfflineQueue│  create_order_header  │   OrderBackend       │
//! │              │──────────────────────►│   (RestBackend)      │
//! │              │  create_order_items   │                      │
//! │              │──────────────────────►│                      │
//! └──────────────┘                       └──────────────────────┘
//! ┌──────────────┐  set_favorite         ┌──────────────────────┐
//! │  favorites   │──────────────────────►│   CatalogBackend     │
//! └──────────────┘                       └──────────────────────┘
//! ```
//!
//! An order is two writes: the header first, then its items under the
//! returned id. Callers that remember the id can retry the second write
//! alone.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use forno_core::{Money, OrderLineItem, OrderPayload, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, RemoteResult};

// =============================================================================
// Wire Types
// =============================================================================

/// Order header row as written to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOrderHeader {
    pub tenant_id: String,
    pub customer_id: Option<String>,
    pub subtotal: Money,
    pub total_discount: Money,
    pub final_total: Money,
    pub payment_method: PaymentMethod,
    pub ticket_number: u32,
    /// When the header was written. Ticket numbering counts on this.
    pub created_at: DateTime<Utc>,
    /// When the cashier closed the order; earlier than `created_at` for
    /// orders drained from the queue.
    pub captured_at: DateTime<Utc>,
}

impl RemoteOrderHeader {
    /// Header stamped now, so a drained order counts toward today's tickets.
    pub fn new(payload: &OrderPayload, ticket_number: u32) -> Self {
        RemoteOrderHeader {
            tenant_id: payload.tenant_id.clone(),
            customer_id: payload.customer_id.clone(),
            subtotal: payload.subtotal,
            total_discount: payload.total_discount,
            final_total: payload.final_total,
            payment_method: payload.payment_method,
            ticket_number,
            created_at: Utc::now(),
            captured_at: payload.created_at,
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Order tables on the hosted backend.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Orders recorded for the tenant at or after `since`.
    async fn count_orders_since(&self, tenant_id: &str, since: DateTime<Utc>) -> RemoteResult<u32>;

    /// Writes the header and returns the backend's id for it.
    async fn create_order_header(&self, header: &RemoteOrderHeader) -> RemoteResult<String>;

    /// Writes the items of an already created header.
    async fn create_order_items(&self, order_id: &str, items: &[OrderLineItem]) -> RemoteResult<()>;
}

/// Product table on the hosted backend.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn set_favorite(&self, product_id: &str, is_favorite: bool) -> RemoteResult<()>;
}

/// Shared handle used by checkout and the queue.
pub type SharedOrderBackend = Arc<dyn OrderBackend>;

// =============================================================================
// Helpers
// =============================================================================

/// Runs a remote call with an upper bound on its duration.
pub async fn bounded<T, F>(limit: Duration, call: F) -> RemoteResult<T>
where
    F: Future<Output = RemoteResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout(limit.as_millis() as u64)),
    }
}

/// Midnight of the current local day, in UTC.
pub fn start_of_local_day() -> DateTime<Utc> {
    let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        // No local midnight (DST gap): fall back to UTC midnight
        .unwrap_or_else(|| midnight.and_utc())
}

/// Next ticket number for the tenant: today's order count plus one.
///
/// Two terminals asking at the same moment get the same number. The
/// backend does not hand out sequences, so this is accepted.
pub async fn next_ticket(backend: &dyn OrderBackend, tenant_id: &str, limit: Duration) -> RemoteResult<u32> {
    let today = bounded(limit, backend.count_orders_since(tenant_id, start_of_local_day())).await?;
    Ok(today.saturating_add(1))
}

// =============================================================================
// In-memory backend for tests
// =============================================================================


#[cfg(test)]
mod tests {
    use super::testing::MemoryBackend;
    use super::*;

    fn payload(tenant: &str) -> OrderPayload {
        OrderPayload {
            tenant_id: tenant.to_string(),
            customer_id: None,
            subtotal: Money::from_cents(30000),
            total_discount: Money::from_cents(3000),
            final_total: Money::from_cents(27000),
            payment_method: PaymentMethod::Cash,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_header_stamped_at_write_time() {
        let mut old = payload("t1");
        old.created_at = Utc::now() - chrono::Duration::days(2);

        let header = RemoteOrderHeader::new(&old, 1);
        assert_eq!(header.captured_at, old.created_at);
        assert!(header.created_at >= start_of_local_day());
    }

    #[test]
    fn test_header_copies_payload() {
        let header = RemoteOrderHeader::new(&payload("t1"), 7);
        assert_eq!(header.ticket_number, 7);
        assert_eq!(header.final_total, Money::from_cents(27000));
        assert!(header.created_at >= header.captured_at);

        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["final_total"], 27000);
        assert_eq!(json["payment_method"], "cash");
    }

    #[test]
    fn test_start_of_local_day_is_not_in_future() {
        let start = start_of_local_day();
        assert!(start <= Utc::now());
        assert!(Utc::now() - start <= chrono::Duration::hours(26));
    }

    #[tokio::test]
    async fn test_next_ticket_counts_tenant_orders() {
        let backend = MemoryBackend::new();
        let limit = Duration::from_secs(5);

        assert_eq!(next_ticket(backend.as_ref(), "t1", limit).await.unwrap(), 1);

        backend.create_order_header(&RemoteOrderHeader::new(&payload("t1"), 1)).await.unwrap();
        backend.create_order_header(&RemoteOrderHeader::new(&payload("t2"), 1)).await.unwrap();

        assert_eq!(next_ticket(backend.as_ref(), "t1", limit).await.unwrap(), 2);
        assert_eq!(next_ticket(backend.as_ref(), "t2", limit).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let backend = MemoryBackend::new();
        backend.set_delay(Some(Duration::from_secs(60)));

        let result = next_ticket(backend.as_ref(), "t1", Duration::from_secs(2)).await;
        assert_eq!(result, Err(RemoteError::Timeout(2000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_keeps_subsecond_limit() {
        let backend = MemoryBackend::new();
        backend.set_delay(Some(Duration::from_secs(60)));

        let err = next_ticket(backend.as_ref(), "t1", Duration::from_millis(250))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Timeout(250));
        assert_eq!(err.to_string(), "Remote call timed out after 250 ms");
    }
}
