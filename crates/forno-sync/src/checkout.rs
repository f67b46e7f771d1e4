//! # Checkout
//!
//! Turns a cart into an order and gets it to the backend, directly when
//! online or through the offline queue when not.
//!
//! ```text
//!  Cart + promotions ──finalize()──► FinalizedOrder
//!                                        │
//!                                   submit()
//!                                        │
//!            ┌──────── offline ──────────┼────────── online ─────────┐
//!            ▼                           │                           ▼
//!     queue.enqueue()                    │           ticket, header, items
//!     Ticket::Offline                    │                 │          │
//!            ▲                           │     retryable   │          │ ok
//!            └───────────────────────────┴─────failure─────┘          ▼
//!                                                             Ticket::Number(n)
//! ```
//!
//! A non-retryable rejection of the header goes back to the caller. Once
//! the header exists any failure queues the order with the remote id, so
//! the drain only sends the items, and the receipt keeps its ticket.

use tracing::{info, warn};

use forno_core::{
    Cart, CoreError, LineGroup, OrderLineItem, OrderPayload, OrderTotals, PaymentMethod,
    PendingOrder, Promotion, Ticket,
};

use crate::agent::Connectivity;
use crate::backend::{bounded, next_ticket, RemoteOrderHeader};
use crate::error::{RemoteError, SyncResult};
use crate::queue::OfflineQueue;

/// An order ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedOrder {
    pub payload: OrderPayload,
    /// Backend rows; composite lines carry their backing product.
    pub line_items: Vec<OrderLineItem>,
    /// Receipt rows as the cashier saw them.
    pub groups: Vec<LineGroup>,
    pub totals: OrderTotals,
}

/// Result of a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub ticket: Ticket,
    /// Set when the order, or the rest of it, went to the queue.
    pub local_id: Option<String>,
    /// Set once the header reached the backend.
    pub remote_order_id: Option<String>,
    pub groups: Vec<LineGroup>,
    pub totals: OrderTotals,
}

impl Receipt {
    pub fn is_offline(&self) -> bool {
        matches!(self.ticket, Ticket::Offline)
    }
}

/// Checkout for one tenant.
#[derive(Clone)]
pub struct Checkout {
    tenant_id: String,
    queue: OfflineQueue,
    connectivity: Connectivity,
}

impl Checkout {
    pub fn new(tenant_id: impl Into<String>, queue: OfflineQueue, connectivity: Connectivity) -> Self {
        Checkout {
            tenant_id: tenant_id.into(),
            queue,
            connectivity,
        }
    }

    /// Prices the cart and builds the order.
    pub fn finalize(
        &self,
        cart: &Cart,
        promotions: &[Promotion],
        customer_id: Option<String>,
        payment_method: PaymentMethod,
    ) -> SyncResult<FinalizedOrder> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let totals = cart.totals(promotions);
        let payload = OrderPayload {
            tenant_id: self.tenant_id.clone(),
            customer_id,
            subtotal: totals.subtotal,
            total_discount: totals.total_discount,
            final_total: totals.final_total,
            payment_method,
            created_at: chrono::Utc::now(),
        };

        Ok(FinalizedOrder {
            payload,
            line_items: line_items(cart),
            groups: cart.groups(),
            totals,
        })
    }

    /// Sends the order, falling back to the queue.
    pub async fn submit(&self, order: FinalizedOrder) -> SyncResult<Receipt> {
        if !self.connectivity.is_online() {
            return self.queue_order(order, None).await;
        }

        let backend = self.queue.backend();
        let limit = self.queue.options().remote_timeout;

        let header = match next_ticket(backend.as_ref(), &self.tenant_id, limit).await {
            Ok(ticket) => RemoteOrderHeader::new(&order.payload, ticket),
            Err(e) => return self.fall_back(order, e).await,
        };

        let remote_id = match bounded(limit, backend.create_order_header(&header)).await {
            Ok(id) => id,
            Err(e) => return self.fall_back(order, e).await,
        };

        if let Err(e) = bounded(limit, backend.create_order_items(&remote_id, &order.line_items)).await {
            warn!(remote_id = %remote_id, error = %e, "Items failed after header, queueing remainder");
            return self.queue_order(order, Some((remote_id, header.ticket_number))).await;
        }

        info!(
            remote_id = %remote_id,
            ticket = header.ticket_number,
            total = %order.totals.final_total,
            "Order submitted"
        );

        Ok(Receipt {
            ticket: Ticket::Number(header.ticket_number),
            local_id: None,
            remote_order_id: Some(remote_id),
            groups: order.groups,
            totals: order.totals,
        })
    }

    async fn fall_back(&self, order: FinalizedOrder, err: RemoteError) -> SyncResult<Receipt> {
        if err.is_retryable() {
            warn!(error = %err, "Backend unavailable, queueing order");
            self.queue_order(order, None).await
        } else {
            Err(err.into())
        }
    }

    /// Queues the order. `created` carries the header id and ticket when
    /// the header already reached the backend.
    async fn queue_order(&self, order: FinalizedOrder, created: Option<(String, u32)>) -> SyncResult<Receipt> {
        let (remote_order_id, ticket) = match created {
            Some((id, number)) => (Some(id), Ticket::Number(number)),
            None => (None, Ticket::Offline),
        };

        let mut pending = PendingOrder::new(order.payload, order.line_items);
        pending.remote_order_id = remote_order_id.clone();

        let local_id = self.queue.enqueue_order(pending).await?;

        Ok(Receipt {
            ticket,
            local_id: Some(local_id),
            remote_order_id,
            groups: order.groups,
            totals: order.totals,
        })
    }
}

/// One row per (backend product, frozen price), in first-appearance order.
fn line_items(cart: &Cart) -> Vec<OrderLineItem> {
    let mut items: Vec<OrderLineItem> = Vec::new();

    for line in cart.lines() {
        let product_id = line.checkout_product_id();
        match items
            .iter_mut()
            .find(|i| i.product_id == product_id && i.unit_price == line.unit_price())
        {
            Some(item) => item.quantity += 1,
            None => items.push(OrderLineItem {
                product_id: product_id.to_string(),
                quantity: 1,
                unit_price: line.unit_price(),
            }),
        }
    }

    items
}

// =============================================================================
// Unit Tests
// =============================================================================
