//! # Repository Module
//!
//! Database repository implementations for Forno POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OfflineQueue (forno-sync)                                              │
//! │       │                                                                 │
//! │       │  db.pending_orders().list_by_status(Pending)                    │
//! │       ▼                                                                 │
//! │  PendingOrderRepository                                                 │
//! │  ├── insert / get / list / count                                        │
//! │  ├── mark_syncing / mark_failed / set_remote_order_id / delete          │
//! │  └── requeue / requeue_all_failed / fail_interrupted                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database (pending_orders)                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod pending_order;
