//! # Offline Queue Operator Tool
//!
//! Inspects and repairs the offline order queue of a terminal.
//!
//! ## Usage
//! ```bash
//! # Counts per status and the records in ERROR
//! cargo run -p forno-sync --bin forno-queue -- status
//!
//! # Every queued record
//! cargo run -p forno-sync --bin forno-queue -- list
//!
//! # Send PENDING records now
//! cargo run -p forno-sync --bin forno-queue -- drain
//!
//! # Move one (or every) ERROR record back to PENDING
//! cargo run -p forno-sync --bin forno-queue -- requeue <LOCAL_ID>
//! cargo run -p forno-sync --bin forno-queue -- requeue --all
//!
//! # Mark records stuck in SYNCING as ERROR
//! cargo run -p forno-sync --bin forno-queue -- recover
//! ```
//!
//! Run it only while the terminal app is closed: the queue's drain lock
//! is per process.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use forno_core::{OrderLineItem, PendingOrderStatus};
use forno_db::{Database, DbConfig};
use forno_sync::{
    OfflineQueue, OrderBackend, QueueConfig, RemoteError, RemoteOrderHeader, RemoteResult,
    RestBackend, RestConfig, SharedOrderBackend, SyncError,
};

/// Stands in for the backend when none is configured. Only `drain` would
/// call it, and `drain` refuses to run without a backend.
struct Unconfigured;

#[async_trait]
impl OrderBackend for Unconfigured {
    async fn count_orders_since(&self, _tenant_id: &str, _since: DateTime<Utc>) -> RemoteResult<u32> {
        Err(RemoteError::Connection("backend not configured".into()))
    }

    async fn create_order_header(&self, _header: &RemoteOrderHeader) -> RemoteResult<String> {
        Err(RemoteError::Connection("backend not configured".into()))
    }

    async fn create_order_items(&self, _order_id: &str, _items: &[OrderLineItem]) -> RemoteResult<()> {
        Err(RemoteError::Connection("backend not configured".into()))
    }
}

fn print_help() {
    println!("Forno POS Offline Queue Tool");
    println!();
    println!("Usage: forno-queue [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  status                 Counts per status and failed records");
    println!("  list                   Every queued record");
    println!("  drain                  Send pending records now");
    println!("  requeue <ID> | --all   Move failed records back to pending");
    println!("  recover                Mark records stuck in syncing as failed");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    Config file (default: platform config dir)");
    println!("  -d, --db <PATH>        Queue database (default: from config)");
    println!("  -h, --help             Show this help message");
}

/// Initializes logging. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forno=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut command: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => command.push(other.to_string()),
        }
        i += 1;
    }

    let Some(verb) = command.first().cloned() else {
        print_help();
        return Ok(());
    };

    init_tracing();

    let config = QueueConfig::load(config_path)?;
    let db_path = db_path
        .or_else(|| config.database_path())
        .ok_or_else(|| SyncError::InvalidConfig("no database path available".into()))?;

    let backend: SharedOrderBackend = if config.has_backend() {
        Arc::new(RestBackend::new(RestConfig::from_queue_config(&config)?))
    } else if verb == "drain" {
        return Err(SyncError::MissingBackend.into());
    } else {
        Arc::new(Unconfigured)
    };

    let db = Arc::new(Database::new(DbConfig::new(&db_path)).await?);
    let queue = OfflineQueue::new(db.clone(), backend, (&config).into());

    println!("Forno POS Offline Queue");
    println!("=======================");
    println!("Database: {}", db_path.display());
    println!("Tenant:   {}", config.tenant_id());
    println!();

    match verb.as_str() {
        "status" => {
            for status in [
                PendingOrderStatus::Pending,
                PendingOrderStatus::Syncing,
                PendingOrderStatus::Error,
            ] {
                println!("{:<8} {}", status, queue.count_by_status(status).await?);
            }

            let failed: Vec<_> = queue
                .list()
                .await?
                .into_iter()
                .filter(|o| o.status == PendingOrderStatus::Error)
                .collect();
            if !failed.is_empty() {
                println!();
                println!("Failed:");
                for order in failed {
                    println!(
                        "  {}  {}  attempts={}  {}",
                        order.local_id,
                        order.payload.final_total,
                        order.attempts,
                        order.last_error.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        "list" => {
            let orders = queue.list().await?;
            if orders.is_empty() {
                println!("Queue is empty");
            }
            for order in orders {
                println!(
                    "{}  {:<8} {}  items={}  created={}",
                    order.local_id,
                    order.status,
                    order.payload.final_total,
                    order.line_items.len(),
                    order.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        "drain" => {
            let synced = queue.drain().await?;
            println!("✓ Synced {} orders", synced);
            println!("  {} still queued", queue.count_pending().await?);
        }
        "requeue" => match command.get(1).map(String::as_str) {
            Some("--all") => {
                let count = queue.requeue_failed().await?;
                println!("✓ Requeued {} orders", count);
            }
            Some(local_id) => {
                queue.requeue(local_id).await?;
                println!("✓ Requeued {}", local_id);
            }
            None => {
                println!("requeue needs a local id or --all");
            }
        },
        "recover" => {
            let count = queue.recover_interrupted().await?;
            println!("✓ Marked {} interrupted orders as failed", count);
        }
        other => {
            println!("Unknown command: {}", other);
            println!();
            print_help();
        }
    }

    db.close().await;
    Ok(())
}
