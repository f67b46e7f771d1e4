//! # Queue Agent
//!
//! Background task that drains the offline queue whenever the terminal
//! comes back online.
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        QueueAgent Architecture                          │
//! │                                                                         │
//! │  Connectivity (watch<bool>)          QueueAgentHandle                   │
//! │  set_online(true/false)              drain_now() / shutdown()           │
//! │        │                                   │                            │
//! │        ▼                                   ▼                            │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         QueueAgent::run                          │  │
//! │  │                                                                  │  │
//! │  │  startup:   recover_interrupted(), drain if already online       │  │
//! │  │  offline → online edge:   drain()                                │  │
//! │  │  drain_now request:       drain(), reply with count              │  │
//! │  │  shutdown:                exit loop                              │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                        QueueEventEmitter                                │
//! │  "queue://status"   - { online: true, pending: 3 }                      │
//! │  "queue://progress" - { pending: 0, synced: 3 }                         │
//! │  "queue://error"    - { message: "...", retryable: false }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::queue::OfflineQueue;

// =============================================================================
// Connectivity
// =============================================================================

/// Shared online/offline flag.
///
/// Whatever probes the network calls `set_online`; the agent and checkout
/// read it.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Connectivity { tx: Arc::new(tx) }
    }

    /// Updates the flag. Returns true if it changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Queue Status
// =============================================================================

/// Snapshot for status displays.
#[derive(Debug, Clone, Default)]
pub struct QueueStatus {
    pub online: bool,

    /// Records in the queue, any status.
    pub pending_count: i64,

    /// End of the last drain that completed.
    pub last_drain: Option<DateTime<Utc>>,

    pub last_error: Option<String>,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives queue events (implemented by the UI integration).
pub trait QueueEventEmitter: Send + Sync {
    /// Emits a status change event.
    fn emit_status(&self, status: &QueueStatus);

    /// Emits drain progress.
    fn emit_progress(&self, pending: i64, synced: usize);

    /// Emits an error event.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl QueueEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &QueueStatus) {}
    fn emit_progress(&self, _pending: i64, _synced: usize) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Queue Agent
// =============================================================================

type DrainReply = oneshot::Sender<SyncResult<usize>>;

/// Drains the queue on reconnect. Spawn `run()` as a background task.
pub struct QueueAgent {
    queue: OfflineQueue,
    connectivity: Connectivity,
    emitter: Arc<dyn QueueEventEmitter>,
    status: Arc<RwLock<QueueStatus>>,
    drain_rx: mpsc::Receiver<DrainReply>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a running agent.
#[derive(Clone)]
pub struct QueueAgentHandle {
    drain_tx: mpsc::Sender<DrainReply>,
    shutdown_tx: mpsc::Sender<()>,
    status: Arc<RwLock<QueueStatus>>,
}

impl QueueAgentHandle {
    /// Runs a drain on the agent task and waits for its result.
    pub async fn drain_now(&self) -> SyncResult<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.drain_tx
            .send(reply_tx)
            .await
            .map_err(|_| SyncError::ShuttingDown)?;

        reply_rx
            .await
            .map_err(|_| SyncError::ChannelError("Drain reply dropped".into()))?
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }

    /// Current status snapshot.
    pub async fn status(&self) -> QueueStatus {
        self.status.read().await.clone()
    }
}

impl QueueAgent {
    /// Creates an agent with a no-op emitter.
    pub fn new(queue: OfflineQueue, connectivity: Connectivity) -> (Self, QueueAgentHandle) {
        Self::with_emitter(queue, connectivity, Arc::new(NoOpEmitter))
    }

    /// Creates an agent with a custom event emitter.
    pub fn with_emitter(
        queue: OfflineQueue,
        connectivity: Connectivity,
        emitter: Arc<dyn QueueEventEmitter>,
    ) -> (Self, QueueAgentHandle) {
        let (drain_tx, drain_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let status = Arc::new(RwLock::new(QueueStatus {
            online: connectivity.is_online(),
            ..QueueStatus::default()
        }));

        let agent = QueueAgent {
            queue,
            connectivity,
            emitter,
            status: status.clone(),
            drain_rx,
            shutdown_rx,
        };

        let handle = QueueAgentHandle {
            drain_tx,
            shutdown_tx,
            status,
        };

        (agent, handle)
    }

    /// Main loop.
    pub async fn run(self) {
        let QueueAgent {
            queue,
            connectivity,
            emitter,
            status,
            mut drain_rx,
            mut shutdown_rx,
        } = self;

        info!("Queue agent started");

        match queue.recover_interrupted().await {
            Ok(0) => {}
            Ok(count) => {
                emitter.emit_error(&format!("{} orders were interrupted mid-sync", count), false)
            }
            Err(e) => {
                error!(error = %e, "Failed to recover interrupted orders");
                emitter.emit_error(&e.to_string(), e.is_retryable());
            }
        }

        let mut online_rx = connectivity.subscribe();
        let mut was_online = *online_rx.borrow_and_update();

        if was_online {
            let _ = drain_and_report(&queue, emitter.as_ref(), &status).await;
        } else {
            refresh_status(&queue, emitter.as_ref(), &status, false).await;
        }

        loop {
            tokio::select! {
                changed = online_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *online_rx.borrow_and_update();
                    refresh_status(&queue, emitter.as_ref(), &status, online).await;

                    if online && !was_online {
                        info!("Back online, draining offline orders");
                        let _ = drain_and_report(&queue, emitter.as_ref(), &status).await;
                    } else if !online {
                        debug!("Went offline");
                    }
                    was_online = online;
                }

                Some(reply) = drain_rx.recv() => {
                    let result = drain_and_report(&queue, emitter.as_ref(), &status).await;
                    let _ = reply.send(result);
                }

                _ = shutdown_rx.recv() => {
                    info!("Queue agent received shutdown");
                    break;
                }
            }
        }

        info!("Queue agent stopped");
    }
}

async fn refresh_status(
    queue: &OfflineQueue,
    emitter: &dyn QueueEventEmitter,
    status: &RwLock<QueueStatus>,
    online: bool,
) {
    let pending = queue.count_pending().await;

    let snapshot = {
        let mut s = status.write().await;
        s.online = online;
        match pending {
            Ok(count) => s.pending_count = count,
            Err(e) => warn!(error = %e, "Could not count queued orders"),
        }
        s.clone()
    };
    emitter.emit_status(&snapshot);
}

async fn drain_and_report(
    queue: &OfflineQueue,
    emitter: &dyn QueueEventEmitter,
    status: &RwLock<QueueStatus>,
) -> SyncResult<usize> {
    let result = queue.drain().await;

    match &result {
        Ok(synced) => {
            let pending = queue.count_pending().await;
            let mut s = status.write().await;
            s.last_drain = Some(Utc::now());
            s.last_error = None;
            if let Ok(count) = pending {
                s.pending_count = count;
            }
            emitter.emit_progress(s.pending_count, *synced);
        }
        Err(e) => {
            error!(error = %e, "Drain failed");
            status.write().await.last_error = Some(e.to_string());
            emitter.emit_error(&e.to_string(), e.is_retryable());
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
