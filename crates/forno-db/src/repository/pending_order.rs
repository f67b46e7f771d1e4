//! # Pending Order Repository
//!
//! Durable storage for orders captured while offline.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    pending_orders row lifecycle                         │
//! │                                                                         │
//! │  insert() ──► 'pending'                                                 │
//! │                  │                                                      │
//! │                  │ mark_syncing()   (claim: only from 'pending')        │
//! │                  ▼                                                      │
//! │               'syncing' ──── set_remote_order_id() (header accepted)    │
//! │                  │                                                      │
//! │        ┌─────────┴──────────┐                                           │
//! │        ▼                    ▼                                           │
//! │    delete()           mark_failed()                                     │
//! │   (row gone)           'error' + last_error                             │
//! │                             │                                           │
//! │                             │ requeue() / requeue_all_failed()          │
//! │                             ▼                                           │
//! │                          'pending'                                      │
//! │                                                                         │
//! │  fail_interrupted(): 'syncing' left by a crash ──► 'error'              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payload and line items are stored as JSON text; the row order (`seq`)
//! is the enqueue order.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use forno_core::{PendingOrder, PendingOrderStatus};

const SELECT_COLUMNS: &str = r#"
    SELECT local_id, payload, line_items, status, last_error,
           remote_order_id, attempts, created_at, attempted_at
    FROM pending_orders
"#;

/// Raw row as stored in SQLite.
#[derive(Debug, sqlx::FromRow)]
struct PendingOrderRow {
    local_id: String,
    payload: String,
    line_items: String,
    status: PendingOrderStatus,
    last_error: Option<String>,
    remote_order_id: Option<String>,
    attempts: i64,
    created_at: DateTime<Utc>,
    attempted_at: Option<DateTime<Utc>>,
}

impl TryFrom<PendingOrderRow> for PendingOrder {
    type Error = DbError;

    fn try_from(row: PendingOrderRow) -> DbResult<Self> {
        let payload = serde_json::from_str(&row.payload)
            .map_err(|e| DbError::corrupt("PendingOrder", &row.local_id, e))?;
        let line_items = serde_json::from_str(&row.line_items)
            .map_err(|e| DbError::corrupt("PendingOrder", &row.local_id, e))?;

        Ok(PendingOrder {
            local_id: row.local_id,
            payload,
            line_items,
            status: row.status,
            last_error: row.last_error,
            attempts: row.attempts,
            remote_order_id: row.remote_order_id,
            created_at: row.created_at,
            attempted_at: row.attempted_at,
        })
    }
}

/// Repository for pending order operations.
#[derive(Debug, Clone)]
pub struct PendingOrderRepository {
    pool: SqlitePool,
}

impl PendingOrderRepository {
    /// Creates a new PendingOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PendingOrderRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Persists a newly captured order.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let order = PendingOrder::new(payload, line_items);
    /// db.pending_orders().insert(&order).await?;
    /// ```
    pub async fn insert(&self, order: &PendingOrder) -> DbResult<()> {
        let payload = serde_json::to_string(&order.payload)?;
        let line_items = serde_json::to_string(&order.line_items)?;

        debug!(
            local_id = %order.local_id,
            items = order.line_items.len(),
            "Inserting pending order"
        );

        sqlx::query(
            r#"
            INSERT INTO pending_orders (
                local_id, tenant_id, payload, line_items, status,
                last_error, remote_order_id, attempts, created_at, attempted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.local_id)
        .bind(&order.payload.tenant_id)
        .bind(payload)
        .bind(line_items)
        .bind(order.status)
        .bind(&order.last_error)
        .bind(&order.remote_order_id)
        .bind(order.attempts)
        .bind(order.created_at)
        .bind(order.attempted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Claims a Pending record for a sync attempt.
    ///
    /// Only succeeds from 'pending', so two drains can never submit the
    /// same record. Returns false if the record was not Pending.
    pub async fn mark_syncing(&self, local_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pending_orders SET
                status = 'syncing',
                attempts = attempts + 1,
                attempted_at = ?2
            WHERE local_id = ?1 AND status = 'pending'
            "#,
        )
        .bind(local_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Records a failed sync attempt.
    pub async fn mark_failed(&self, local_id: &str, error: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pending_orders SET
                status = 'error',
                last_error = ?2
            WHERE local_id = ?1
            "#,
        )
        .bind(local_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PendingOrder", local_id));
        }
        Ok(())
    }

    /// Remembers the remote order created for this record.
    pub async fn set_remote_order_id(&self, local_id: &str, remote_order_id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE pending_orders SET remote_order_id = ?2 WHERE local_id = ?1")
            .bind(local_id)
            .bind(remote_order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PendingOrder", local_id));
        }
        Ok(())
    }

    /// Deletes a record once the backend has accepted it.
    /// Returns false if it was already gone.
    pub async fn delete(&self, local_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM pending_orders WHERE local_id = ?1")
            .bind(local_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Moves one Error record back to Pending, clearing its error.
    /// Returns false if the record is not in Error.
    pub async fn requeue(&self, local_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pending_orders SET
                status = 'pending',
                last_error = NULL
            WHERE local_id = ?1 AND status = 'error'
            "#,
        )
        .bind(local_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Moves every Error record back to Pending. Returns how many moved.
    pub async fn requeue_all_failed(&self) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE pending_orders SET status = 'pending', last_error = NULL WHERE status = 'error'",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Moves records stuck in Syncing to Error.
    ///
    /// A record can only be Syncing at startup if the process died mid
    /// attempt. Whether the backend received it is unknown, so it waits for
    /// an operator instead of being sent again.
    pub async fn fail_interrupted(&self, reason: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE pending_orders SET status = 'error', last_error = ?1 WHERE status = 'syncing'",
        )
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a record by local id.
    pub async fn get(&self, local_id: &str) -> DbResult<Option<PendingOrder>> {
        let row: Option<PendingOrderRow> =
            sqlx::query_as(&format!("{} WHERE local_id = ?1", SELECT_COLUMNS))
                .bind(local_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(PendingOrder::try_from).transpose()
    }

    /// All records in enqueue order.
    pub async fn list(&self) -> DbResult<Vec<PendingOrder>> {
        let rows: Vec<PendingOrderRow> =
            sqlx::query_as(&format!("{} ORDER BY seq ASC", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(PendingOrder::try_from).collect()
    }

    /// Records in one status, in enqueue order.
    pub async fn list_by_status(&self, status: PendingOrderStatus) -> DbResult<Vec<PendingOrder>> {
        let rows: Vec<PendingOrderRow> =
            sqlx::query_as(&format!("{} WHERE status = ?1 ORDER BY seq ASC", SELECT_COLUMNS))
                .bind(status)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(PendingOrder::try_from).collect()
    }

    /// Counts all records regardless of status.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts records in one status.
    pub async fn count_by_status(&self, status: PendingOrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
