//! Background pruning of edges that belong to deleted notes
//!
//! Listens for `NoteDeleted` on the note store's event channel and removes
//! every edge whose source or target was the deleted note. When the receiver
//! lags and events are dropped, a full dangling-edge sweep runs instead.

use crate::db::DomainEvent;
use crate::services::LinkEngine;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Handle to the running pruner task
pub struct DeletionPruner {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl DeletionPruner {
    pub(crate) fn spawn(engine: Arc<LinkEngine>) -> Self {
        let mut events = engine.note_events();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            tracing::info!("Deletion pruner started");
            loop {
                tokio::select! {
                    biased; // Check shutdown first

                    _ = shutdown_rx.recv() => {
                        tracing::info!("Deletion pruner shutting down");
                        break;
                    }

                    event = events.recv() => match event {
                        Ok(DomainEvent::NoteDeleted { owner_id, id }) => {
                            match engine.prune_note_for(&owner_id, &id).await {
                                Ok(removed) => tracing::debug!(
                                    "Pruned {} link(s) of deleted note {}",
                                    removed,
                                    id
                                ),
                                Err(e) => tracing::warn!(
                                    "Failed to prune links of deleted note {}: {}",
                                    id,
                                    e
                                ),
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Deletion pruner lagged, {} event(s) skipped", skipped);
                            match engine.prune_dangling().await {
                                Ok(removed) => tracing::info!(
                                    "Lag recovery removed {} dangling link(s)",
                                    removed
                                ),
                                Err(e) => tracing::warn!("Lag recovery sweep failed: {}", e),
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Note event channel closed, stopping pruner");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::warn!("Deletion pruner task ended abnormally: {}", e);
        }
    }
}
