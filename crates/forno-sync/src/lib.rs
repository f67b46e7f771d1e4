//! # forno-sync: Checkout and Offline Queue for Forno POS
//!
//! Everything that crosses the network: submitting orders at checkout,
//! holding them in a durable queue while the terminal is offline, and
//! draining that queue exactly once when connectivity returns.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Layer Architecture                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          Checkout                                │  │
//! │  │  finalize(cart, promotions) → submit()                           │  │
//! │  │  online: ticket #n          offline / transient failure: queue   │  │
//! │  └───────────────┬───────────────────────────────┬──────────────────┘  │
//! │                  │                               │                      │
//! │                  ▼                               ▼                      │
//! │  ┌────────────────────────────┐   ┌───────────────────────────────┐    │
//! │  │  OrderBackend (trait)      │◄──│  OfflineQueue                 │    │
//! │  │  RestBackend (reqwest)     │   │  SQLite via forno-db          │    │
//! │  │  count / header / items    │   │  PENDING → SYNCING → deleted  │    │
//! │  └────────────────────────────┘   │                 └──→ ERROR    │    │
//! │                                   └───────────────▲───────────────┘    │
//! │                                                   │                     │
//! │  ┌────────────────────────────┐   ┌───────────────┴───────────────┐    │
//! │  │  Connectivity (watch)      │──►│  QueueAgent                   │    │
//! │  │  set_online(bool)          │   │  drains on offline → online   │    │
//! │  └────────────────────────────┘   └───────────────────────────────┘    │
//! │                                                                         │
//! │  STATUS EVENTS (QueueEventEmitter):                                     │
//! │  • "queue://status"   - online flag, queued count                       │
//! │  • "queue://progress" - pending / synced after a drain                  │
//! │  • "queue://error"    - drain or recovery failures                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - `Connectivity` flag and the `QueueAgent` drain task
//! - [`backend`] - Remote boundary traits and ticket numbering
//! - [`checkout`] - Finalize and submit orders
//! - [`config`] - Terminal configuration (tenant, backend, queue)
//! - [`error`] - `SyncError` and `RemoteError`
//! - [`favorites`] - Optimistic favorite toggle
//! - [`queue`] - The offline order queue
//! - [`rest`] - `reqwest` implementation of the backend traits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use forno_db::{Database, DbConfig};
//! use forno_sync::{Checkout, Connectivity, OfflineQueue, QueueAgent, QueueConfig, RestBackend, RestConfig};
//!
//! let config = QueueConfig::load(None)?;
//! let db = Arc::new(Database::new(DbConfig::new(path)).await?);
//! let backend = Arc::new(RestBackend::new(RestConfig::from_queue_config(&config)?));
//!
//! let queue = OfflineQueue::new(db, backend, (&config).into());
//! let connectivity = Connectivity::new(false);
//!
//! let (agent, handle) = QueueAgent::new(queue.clone(), connectivity.clone());
//! tokio::spawn(agent.run());
//!
//! let checkout = Checkout::new(config.tenant_id(), queue, connectivity);
//! let order = checkout.finalize(&cart, catalog.promotions(), None, PaymentMethod::Cash)?;
//! let receipt = checkout.submit(order).await?;
//! println!("Ticket {}", receipt.ticket);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod backend;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod queue;
pub mod rest;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{Connectivity, NoOpEmitter, QueueAgent, QueueAgentHandle, QueueEventEmitter, QueueStatus};
pub use backend::{CatalogBackend, OrderBackend, RemoteOrderHeader, SharedOrderBackend};
pub use checkout::{Checkout, FinalizedOrder, Receipt};
pub use config::{BackendConfig, QueueConfig, QueueSettings, TerminalConfig};
pub use error::{RemoteError, RemoteResult, SyncError, SyncResult};
pub use favorites::toggle_favorite;
pub use queue::{OfflineQueue, QueueOptions};
pub use rest::{RestBackend, RestConfig};
