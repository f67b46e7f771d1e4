//! # Offline Order Queue
//!
//! Durable store-and-forward for orders captured while the terminal has no
//! connection. Each order reaches the backend exactly once.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Pending Order State Machine                          │
//! │                                                                         │
//! │   enqueue()                                                             │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  ┌─────────┐  drain claims  ┌─────────┐  header + items ok             │
//! │  │ PENDING │───────────────►│ SYNCING │───────────────────► (deleted)   │
//! │  └─────────┘                └────┬────┘                                 │
//! │      ▲                           │ remote failure / timeout             │
//! │      │                           ▼                                      │
//! │      │   requeue()          ┌─────────┐                                 │
//! │      └──────────────────────│  ERROR  │◄──── recover_interrupted()      │
//! │                             └─────────┘      (SYNCING left by a crash)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Drain Pass
//! 1. Take the drain lock (one pass at a time per process)
//! 2. Optionally requeue ERROR records (`retry_failed_on_drain`), except
//!    those marked interrupted
//! 3. For each PENDING record in enqueue order:
//!    - claim it (PENDING → SYNCING)
//!    - ticket = today's order count + 1
//!    - create the header unless a remote id is already recorded
//!    - create the items, then delete the record
//!    - on any remote failure record the message and move on
//!
//! A local store failure aborts the pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use forno_core::{OrderLineItem, OrderPayload, PendingOrder, PendingOrderStatus};
use forno_db::Database;

use crate::backend::{bounded, next_ticket, RemoteOrderHeader, SharedOrderBackend};
use crate::config::QueueConfig;
use crate::error::{SyncError, SyncResult};

/// Message recorded on records found in SYNCING at startup.
pub const INTERRUPTED_MESSAGE: &str = "interrupted";

// =============================================================================
// Options
// =============================================================================

/// Runtime knobs for the queue.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Bound on each remote call.
    pub remote_timeout: Duration,

    /// Requeue ERROR records at the start of every drain. Records marked
    /// interrupted still wait for an operator.
    pub retry_failed_on_drain: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        QueueOptions {
            remote_timeout: Duration::from_secs(30),
            retry_failed_on_drain: false,
        }
    }
}

impl From<&QueueConfig> for QueueOptions {
    fn from(config: &QueueConfig) -> Self {
        QueueOptions {
            remote_timeout: config.remote_timeout(),
            retry_failed_on_drain: config.queue.retry_failed_on_drain,
        }
    }
}

// =============================================================================
// Offline Queue
// =============================================================================

/// Offline order queue. Cheap to clone; clones share the drain lock.
#[derive(Clone)]
pub struct OfflineQueue {
    db: Arc<Database>,
    backend: SharedOrderBackend,
    options: QueueOptions,
    drain_lock: Arc<Mutex<()>>,
}

impl OfflineQueue {
    pub fn new(db: Arc<Database>, backend: SharedOrderBackend, options: QueueOptions) -> Self {
        OfflineQueue {
            db,
            backend,
            options,
            drain_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn options(&self) -> &QueueOptions {
        &self.options
    }

    pub(crate) fn backend(&self) -> &SharedOrderBackend {
        &self.backend
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Persists an order as PENDING. Never touches the network.
    pub async fn enqueue(
        &self,
        payload: OrderPayload,
        line_items: Vec<OrderLineItem>,
    ) -> SyncResult<String> {
        self.enqueue_order(PendingOrder::new(payload, line_items)).await
    }

    /// Persists a prepared record (checkout uses this to keep a remote id).
    pub(crate) async fn enqueue_order(&self, order: PendingOrder) -> SyncResult<String> {
        self.db.pending_orders().insert(&order).await?;

        info!(
            local_id = %order.local_id,
            items = order.line_items.len(),
            total = %order.payload.final_total,
            "Order queued offline"
        );
        Ok(order.local_id)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// All records regardless of status.
    pub async fn count_pending(&self) -> SyncResult<i64> {
        Ok(self.db.pending_orders().count().await?)
    }

    pub async fn count_by_status(&self, status: PendingOrderStatus) -> SyncResult<i64> {
        Ok(self.db.pending_orders().count_by_status(status).await?)
    }

    /// All records in enqueue order.
    pub async fn list(&self) -> SyncResult<Vec<PendingOrder>> {
        Ok(self.db.pending_orders().list().await?)
    }

    pub async fn get(&self, local_id: &str) -> SyncResult<Option<PendingOrder>> {
        Ok(self.db.pending_orders().get(local_id).await?)
    }

    // =========================================================================
    // Drain
    // =========================================================================

    /// Submits every PENDING record. Returns how many reached the backend.
    pub async fn drain(&self) -> SyncResult<usize> {
        let _pass = self.drain_lock.lock().await;
        let repo = self.db.pending_orders();

        if self.options.retry_failed_on_drain {
            let mut requeued = 0;
            for order in repo.list_by_status(PendingOrderStatus::Error).await? {
                if order.last_error.as_deref() == Some(INTERRUPTED_MESSAGE) {
                    continue;
                }
                if repo.requeue(&order.local_id).await? {
                    requeued += 1;
                }
            }
            if requeued > 0 {
                info!(requeued, "Retrying failed orders");
            }
        }

        let pending = repo.list_by_status(PendingOrderStatus::Pending).await?;
        if pending.is_empty() {
            debug!("Nothing to drain");
            return Ok(0);
        }

        info!(count = pending.len(), "Draining offline orders");

        let mut synced = 0;
        for order in pending {
            if !repo.mark_syncing(&order.local_id).await? {
                debug!(local_id = %order.local_id, "Record no longer pending, skipping");
                continue;
            }

            match self.submit(&order).await {
                Ok(remote_id) => {
                    repo.delete(&order.local_id).await?;
                    synced += 1;
                    info!(local_id = %order.local_id, remote_id = %remote_id, "Offline order synced");
                }
                Err(SyncError::Database(e)) => {
                    error!(local_id = %order.local_id, error = %e, "Store failed mid-drain");
                    return Err(SyncError::Database(e));
                }
                Err(e) => {
                    warn!(local_id = %order.local_id, error = %e, "Offline order failed to sync");
                    repo.mark_failed(&order.local_id, &e.to_string()).await?;
                }
            }
        }

        info!(synced, "Drain complete");
        Ok(synced)
    }

    /// Header (unless already recorded) then items.
    async fn submit(&self, order: &PendingOrder) -> SyncResult<String> {
        let limit = self.options.remote_timeout;

        let remote_id = match order.remote_order_id.clone() {
            Some(id) => {
                debug!(local_id = %order.local_id, remote_id = %id, "Header already created, sending items only");
                id
            }
            None => {
                let ticket = next_ticket(self.backend.as_ref(), &order.payload.tenant_id, limit).await?;
                let header = RemoteOrderHeader::new(&order.payload, ticket);
                let id = bounded(limit, self.backend.create_order_header(&header)).await?;

                self.db
                    .pending_orders()
                    .set_remote_order_id(&order.local_id, &id)
                    .await?;
                debug!(local_id = %order.local_id, remote_id = %id, ticket, "Header created");
                id
            }
        };

        bounded(limit, self.backend.create_order_items(&remote_id, &order.line_items)).await?;
        Ok(remote_id)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Moves one ERROR record back to PENDING.
    pub async fn requeue(&self, local_id: &str) -> SyncResult<()> {
        if self.db.pending_orders().requeue(local_id).await? {
            info!(local_id, "Order requeued");
            Ok(())
        } else {
            Err(SyncError::NotRequeueable {
                local_id: local_id.to_string(),
            })
        }
    }

    /// Moves every ERROR record back to PENDING.
    pub async fn requeue_failed(&self) -> SyncResult<u64> {
        let count = self.db.pending_orders().requeue_all_failed().await?;
        info!(count, "Failed orders requeued");
        Ok(count)
    }

    /// Marks records left in SYNCING by a crash as ERROR.
    ///
    /// Whether such an order reached the backend is unknown, so it waits
    /// for an operator instead of being sent again.
    pub async fn recover_interrupted(&self) -> SyncResult<u64> {
        let _pass = self.drain_lock.lock().await;
        let count = self
            .db
            .pending_orders()
            .fail_interrupted(INTERRUPTED_MESSAGE)
            .await?;
        if count > 0 {
            warn!(count, "Recovered orders interrupted mid-sync");
        }
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MemoryBackend;
    use crate::error::RemoteError;
    use chrono::Utc;
    use forno_core::{Money, PaymentMethod};
    use forno_db::DbConfig;

    async fn setup(options: QueueOptions) -> (OfflineQueue, Arc<MemoryBackend>, Arc<Database>) {
        let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let backend = MemoryBackend::new();
        let queue = OfflineQueue::new(db.clone(), backend.clone(), options);
        (queue, backend, db)
    }

    fn payload(total: i64) -> OrderPayload {
        OrderPayload {
            tenant_id: "pizzeria".to_string(),
            customer_id: None,
            subtotal: Money::from_cents(total),
            total_discount: Money::zero(),
            final_total: Money::from_cents(total),
            payment_method: PaymentMethod::Cash,
            created_at: Utc::now(),
        }
    }

    fn items() -> Vec<OrderLineItem> {
        vec![OrderLineItem {
            product_id: "margherita".to_string(),
            quantity: 1,
            unit_price: Money::from_cents(18000),
        }]
    }

    #[tokio::test]
    async fn test_enqueue_is_pending() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        let id = queue.enqueue(payload(18000), items()).await.unwrap();

        let stored = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, PendingOrderStatus::Pending);
        assert_eq!(queue.count_pending().await.unwrap(), 1);
        assert_eq!(backend.header_count(), 0);
    }

    #[tokio::test]
    async fn test_drain_syncs_and_deletes() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        queue.enqueue(payload(18000), items()).await.unwrap();
        queue.enqueue(payload(22000), items()).await.unwrap();

        assert_eq!(queue.drain().await.unwrap(), 2);
        assert_eq!(queue.count_pending().await.unwrap(), 0);
        assert_eq!(backend.header_count(), 2);
        assert_eq!(backend.item_writes(), 2);

        // Tickets follow today's count, in enqueue order
        let headers = backend.headers.lock().unwrap();
        assert_eq!(headers[0].1.ticket_number, 1);
        assert_eq!(headers[1].1.ticket_number, 2);
        assert_eq!(headers[0].1.final_total, Money::from_cents(18000));
    }

    #[tokio::test]
    async fn test_drain_empty_queue() {
        let (queue, _backend, _db) = setup(QueueOptions::default()).await;
        assert_eq!(queue.drain().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_later_records() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        let first = queue.enqueue(payload(18000), items()).await.unwrap();
        queue.enqueue(payload(22000), items()).await.unwrap();
        backend.fail_next_header(RemoteError::from_status(400, "bad tenant"));

        assert_eq!(queue.drain().await.unwrap(), 1);

        let failed = queue.get(&first).await.unwrap().unwrap();
        assert_eq!(failed.status, PendingOrderStatus::Error);
        assert!(failed.last_error.unwrap().contains("bad tenant"));
        assert_eq!(failed.attempts, 1);
        assert_eq!(queue.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_record_stays_counted() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        queue.enqueue(payload(18000), items()).await.unwrap();
        backend.fail_next_header(RemoteError::Connection("refused".into()));

        assert_eq!(queue.count_pending().await.unwrap(), 1);
        assert_eq!(queue.count_by_status(PendingOrderStatus::Pending).await.unwrap(), 1);

        assert_eq!(queue.drain().await.unwrap(), 0);

        // Still queued, no longer eligible for a drain
        assert_eq!(queue.count_pending().await.unwrap(), 1);
        assert_eq!(queue.count_by_status(PendingOrderStatus::Pending).await.unwrap(), 0);
        assert_eq!(queue.count_by_status(PendingOrderStatus::Error).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_orders_from_earlier_day_get_sequential_tickets() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        let captured = Utc::now() - chrono::Duration::days(2);
        for total in [18000, 22000, 15000] {
            let mut old = payload(total);
            old.created_at = captured;
            queue.enqueue(old, items()).await.unwrap();
        }

        assert_eq!(queue.drain().await.unwrap(), 3);

        let headers = backend.headers.lock().unwrap();
        let tickets: Vec<u32> = headers.iter().map(|(_, h)| h.ticket_number).collect();
        assert_eq!(tickets, vec![1, 2, 3]);
        assert!(headers.iter().all(|(_, h)| h.captured_at == captured));
    }

    #[tokio::test]
    async fn test_error_records_wait_for_requeue() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        let id = queue.enqueue(payload(18000), items()).await.unwrap();
        backend.fail_next_header(RemoteError::Connection("refused".into()));
        assert_eq!(queue.drain().await.unwrap(), 0);

        // Not retried automatically
        assert_eq!(queue.drain().await.unwrap(), 0);
        assert_eq!(backend.header_count(), 0);

        queue.requeue(&id).await.unwrap();
        assert_eq!(queue.drain().await.unwrap(), 1);
        assert_eq!(backend.header_count(), 1);
    }

    #[tokio::test]
    async fn test_requeue_rejects_non_error_record() {
        let (queue, _backend, _db) = setup(QueueOptions::default()).await;

        let id = queue.enqueue(payload(18000), items()).await.unwrap();
        assert!(matches!(
            queue.requeue(&id).await,
            Err(SyncError::NotRequeueable { .. })
        ));
        assert!(queue.requeue("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_retry_failed_on_drain() {
        let options = QueueOptions {
            retry_failed_on_drain: true,
            ..QueueOptions::default()
        };
        let (queue, backend, _db) = setup(options).await;

        queue.enqueue(payload(18000), items()).await.unwrap();
        backend.fail_next_header(RemoteError::Connection("refused".into()));
        assert_eq!(queue.drain().await.unwrap(), 0);

        assert_eq!(queue.drain().await.unwrap(), 1);
        assert_eq!(queue.count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retry_failed_on_drain_skips_interrupted() {
        let options = QueueOptions {
            retry_failed_on_drain: true,
            ..QueueOptions::default()
        };
        let (queue, backend, db) = setup(options).await;

        let stuck = queue.enqueue(payload(18000), items()).await.unwrap();
        assert!(db.pending_orders().mark_syncing(&stuck).await.unwrap());
        assert_eq!(queue.recover_interrupted().await.unwrap(), 1);

        queue.enqueue(payload(22000), items()).await.unwrap();
        backend.fail_next_header(RemoteError::Connection("refused".into()));
        assert_eq!(queue.drain().await.unwrap(), 0);

        // The refused one is retried; the interrupted one is left alone
        assert_eq!(queue.drain().await.unwrap(), 1);
        assert_eq!(backend.header_count(), 1);

        let record = queue.get(&stuck).await.unwrap().unwrap();
        assert_eq!(record.status, PendingOrderStatus::Error);
        assert_eq!(record.last_error.as_deref(), Some(INTERRUPTED_MESSAGE));
    }

    #[tokio::test]
    async fn test_header_not_duplicated_on_retry() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        let id = queue.enqueue(payload(18000), items()).await.unwrap();
        backend.fail_next_items(RemoteError::from_status(503, "busy"));

        assert_eq!(queue.drain().await.unwrap(), 0);
        let failed = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(failed.remote_order_id.as_deref(), Some("order-1"));

        assert_eq!(queue.requeue_failed().await.unwrap(), 1);
        assert_eq!(queue.drain().await.unwrap(), 1);

        assert_eq!(backend.header_count(), 1);
        let writes = backend.items.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "order-1");
    }

    #[tokio::test]
    async fn test_timeout_becomes_error() {
        let options = QueueOptions {
            remote_timeout: Duration::from_millis(100),
            ..QueueOptions::default()
        };
        let (queue, backend, _db) = setup(options).await;

        let id = queue.enqueue(payload(18000), items()).await.unwrap();
        backend.set_delay(Some(Duration::from_secs(60)));

        assert_eq!(queue.drain().await.unwrap(), 0);

        let failed = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(failed.status, PendingOrderStatus::Error);
        assert!(failed.last_error.unwrap().contains("timed out"));
        assert_eq!(queue.count_by_status(PendingOrderStatus::Syncing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recover_interrupted() {
        let (queue, backend, db) = setup(QueueOptions::default()).await;

        let id = queue.enqueue(payload(18000), items()).await.unwrap();
        // Simulate a crash after the claim
        assert!(db.pending_orders().mark_syncing(&id).await.unwrap());

        assert_eq!(queue.recover_interrupted().await.unwrap(), 1);

        let record = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, PendingOrderStatus::Error);
        assert_eq!(record.last_error.as_deref(), Some(INTERRUPTED_MESSAGE));

        // Not resent by a drain
        assert_eq!(queue.drain().await.unwrap(), 0);
        assert_eq!(backend.header_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_drains_send_once() {
        let (queue, backend, _db) = setup(QueueOptions::default()).await;

        for total in [18000, 22000, 15000] {
            queue.enqueue(payload(total), items()).await.unwrap();
        }

        let other = queue.clone();
        let (a, b) = tokio::join!(queue.drain(), other.drain());
        assert_eq!(a.unwrap() + b.unwrap(), 3);
        assert_eq!(backend.header_count(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_drain() {
        let (queue, _backend, db) = setup(QueueOptions::default()).await;

        queue.enqueue(payload(18000), items()).await.unwrap();
        db.close().await;

        assert!(matches!(queue.drain().await, Err(SyncError::Database(_))));
    }
}
