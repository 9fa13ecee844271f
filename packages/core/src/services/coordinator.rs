//! Optimistic Mutation Coordinator
//!
//! Applies link mutations to a local view before the durable write completes,
//! then reconciles the view with the store's answer.
//!
//! # Mutation lifecycle
//!
//! ```text
//! Pending (temporary id, is_optimistic) ──ok──▶ Committed (durable record, same slot)
//!                                       └─err─▶ RolledBack (slot removed, notification)
//! ```
//!
//! Reconciliation looks records up by their temporary id, never by position in
//! the view, so concurrent mutations may complete in any order. The view lock
//! is never held while a store call is awaited.

use crate::config::EngineConfig;
use crate::db::LinkStore;
use crate::models::{EdgeId, EdgeSpec, LinkEdge};
use crate::services::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

/// An edge in the local view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEdge {
    pub edge: LinkEdge,
    /// True while the durable write has not been confirmed
    pub is_optimistic: bool,
}

impl CachedEdge {
    fn committed(edge: LinkEdge) -> Self {
        Self {
            edge,
            is_optimistic: false,
        }
    }

    fn pending(edge: LinkEdge) -> Self {
        Self {
            edge,
            is_optimistic: true,
        }
    }
}

/// Handle for restoring a deleted edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoToken(String);

impl UndoToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UndoToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    Create,
    Delete,
    BatchCreate,
}

/// One item of a batch that did not commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Position of the spec in the request
    pub index: usize,
    pub spec: EdgeSpec,
    pub error: LinkError,
}

/// Outcome of a batch create; partial success is normal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Committed edges in request order
    pub committed: Vec<LinkEdge>,
    /// Failed items in request order
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// User-facing notifications raised by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineNotification {
    /// An optimistic change was reverted
    RolledBack {
        kind: MutationKind,
        edge_id: EdgeId,
        error: LinkError,
    },
    /// An edge was deleted and can be restored with `undo_token`
    Deleted {
        edge_id: EdgeId,
        undo_token: Option<UndoToken>,
    },
    /// Some items of a batch failed; the rest committed
    BatchPartialFailure {
        committed: usize,
        failures: Vec<BatchFailure>,
    },
}

#[derive(Debug, Clone)]
struct UndoEntry {
    token: UndoToken,
    edge: LinkEdge,
    deleted_at: Instant,
}

/// Local optimistic view of link edges, backed by a [`LinkStore`]
///
/// The view holds edges of every owner the coordinator has seen; all reads
/// and writes are filtered by owner.
pub struct OptimisticCoordinator {
    store: Arc<dyn LinkStore>,
    view: RwLock<Vec<CachedEdge>>,
    undo: Mutex<VecDeque<UndoEntry>>,
    undo_capacity: usize,
    undo_window: Duration,
    next_temporary: AtomicU64,
    notifications: broadcast::Sender<EngineNotification>,
}

impl OptimisticCoordinator {
    pub fn new(store: Arc<dyn LinkStore>, config: &EngineConfig) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            store,
            view: RwLock::new(Vec::new()),
            undo: Mutex::new(VecDeque::new()),
            undo_capacity: config.undo_capacity,
            undo_window: config.undo_window(),
            next_temporary: AtomicU64::new(1),
            notifications,
        }
    }

    /// Subscribe to rollback, delete and batch notifications
    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.notifications.subscribe()
    }

    fn notify(&self, notification: EngineNotification) {
        // No subscribers is fine
        let _ = self.notifications.send(notification);
    }

    fn temporary_id(&self) -> EdgeId {
        EdgeId::temporary(self.next_temporary.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // View
    // =========================================================================

    /// Snapshot of the owner's cached edges in view order
    pub async fn view(&self, owner_id: &str) -> Vec<CachedEdge> {
        self.view
            .read()
            .await
            .iter()
            .filter(|c| c.edge.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Replace the owner's cached edges with a fresh fetch
    ///
    /// Pending optimistic records survive so their writes can still reconcile.
    pub async fn load(&self, owner_id: &str, edges: Vec<LinkEdge>) {
        let mut view = self.view.write().await;
        view.retain(|c| c.edge.owner_id != owner_id || c.is_optimistic);
        let count = edges.len();
        view.extend(edges.into_iter().map(CachedEdge::committed));
        tracing::debug!("Loaded {} edge(s) into view for {}", count, owner_id);
    }

    /// Fetch the owner's edges from the store and load them
    pub async fn refresh(&self, owner_id: &str) -> LinkResult<usize> {
        let edges = self.store.list_edges_for_owner(owner_id).await?;
        let count = edges.len();
        self.load(owner_id, edges).await;
        Ok(count)
    }

    /// Drop cached edges whose source or target is `note_id`
    pub async fn evict_note(&self, owner_id: &str, note_id: &str) -> usize {
        let mut view = self.view.write().await;
        let before = view.len();
        view.retain(|c| c.edge.owner_id != owner_id || !c.edge.touches(note_id));
        before - view.len()
    }

    /// Swap the record with `temporary` for its durable counterpart
    ///
    /// If a fresh fetch already brought in the durable record, the temporary
    /// one is simply dropped.
    fn commit_in(view: &mut Vec<CachedEdge>, temporary: &EdgeId, durable: &LinkEdge) {
        let already_loaded = view.iter().any(|c| c.edge.id == durable.id);
        match view.iter().position(|c| &c.edge.id == temporary) {
            Some(pos) if already_loaded => {
                view.remove(pos);
            }
            Some(pos) => view[pos] = CachedEdge::committed(durable.clone()),
            None => {
                tracing::debug!("Pending edge {} left the view before commit", temporary);
            }
        }
    }

    fn remove_in(view: &mut Vec<CachedEdge>, id: &EdgeId) -> bool {
        match view.iter().position(|c| &c.edge.id == id) {
            Some(pos) => {
                view.remove(pos);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Create a link optimistically
    ///
    /// Validation failures return before the view changes. Store failures roll
    /// the pending record back and raise a notification.
    pub async fn create_link(&self, owner_id: &str, spec: EdgeSpec) -> LinkResult<LinkEdge> {
        spec.validate()?;

        let temporary = self.temporary_id();
        {
            let pending = spec.clone().into_edge(temporary.clone(), owner_id);
            self.view.write().await.push(CachedEdge::pending(pending));
        }
        tracing::debug!("Pending link {} -> {}", spec.source_note_id, spec.target_note_id);

        match self.store.create_edge(owner_id, spec).await {
            Ok(edge) => {
                Self::commit_in(&mut *self.view.write().await, &temporary, &edge);
                tracing::debug!("Committed link {} (was {})", edge.id, temporary);
                Ok(edge)
            }
            Err(e) => {
                Self::remove_in(&mut *self.view.write().await, &temporary);
                tracing::warn!("Rolled back link {}: {}", temporary, e);
                self.notify(EngineNotification::RolledBack {
                    kind: MutationKind::Create,
                    edge_id: temporary,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    // =========================================================================
    // Delete and undo
    // =========================================================================

    /// Delete a link optimistically
    ///
    /// Returns an undo token when the edge was in the view. A pending edge
    /// cannot be deleted until its write settles.
    pub async fn delete_link(
        &self,
        owner_id: &str,
        edge_id: &EdgeId,
    ) -> LinkResult<Option<UndoToken>> {
        let removed = {
            let mut view = self.view.write().await;
            match view
                .iter()
                .position(|c| &c.edge.id == edge_id && c.edge.owner_id == owner_id)
            {
                Some(pos) if view[pos].is_optimistic => {
                    return Err(LinkError::conflict(format!(
                        "Link {} is still being saved",
                        edge_id
                    )));
                }
                Some(pos) => Some((pos, view.remove(pos))),
                None if edge_id.is_temporary() => {
                    return Err(LinkError::conflict(format!(
                        "Link {} has no durable record",
                        edge_id
                    )));
                }
                None => None,
            }
        };

        let token = match &removed {
            Some((_, cached)) => Some(self.push_undo(cached.edge.clone()).await),
            None => None,
        };

        match self.store.delete_edge(owner_id, edge_id).await {
            Ok(()) => {
                tracing::debug!("Deleted link {}", edge_id);
                self.notify(EngineNotification::Deleted {
                    edge_id: edge_id.clone(),
                    undo_token: token.clone(),
                });
                Ok(token)
            }
            Err(e) => {
                if let Some((pos, cached)) = removed {
                    let mut view = self.view.write().await;
                    // A reload during the delete may already have restored it
                    if !view.iter().any(|c| c.edge.id == cached.edge.id) {
                        let pos = pos.min(view.len());
                        view.insert(pos, cached);
                    }
                }
                if let Some(token) = &token {
                    self.undo.lock().await.retain(|entry| &entry.token != token);
                }
                tracing::warn!("Delete of link {} failed: {}", edge_id, e);
                self.notify(EngineNotification::RolledBack {
                    kind: MutationKind::Delete,
                    edge_id: edge_id.clone(),
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    async fn push_undo(&self, edge: LinkEdge) -> UndoToken {
        let token = UndoToken::generate();
        let mut undo = self.undo.lock().await;
        self.expire_undo(&mut undo);
        undo.push_back(UndoEntry {
            token: token.clone(),
            edge,
            deleted_at: Instant::now(),
        });
        while undo.len() > self.undo_capacity {
            undo.pop_front();
        }
        token
    }

    fn expire_undo(&self, undo: &mut VecDeque<UndoEntry>) {
        let window = self.undo_window;
        undo.retain(|entry| entry.deleted_at.elapsed() <= window);
    }

    async fn take_undo<F>(&self, select: F) -> Option<UndoEntry>
    where
        F: Fn(&UndoEntry) -> bool,
    {
        let mut undo = self.undo.lock().await;
        self.expire_undo(&mut undo);
        let pos = undo.iter().rposition(select)?;
        undo.remove(pos)
    }

    /// Restore the edge deleted under `token`
    ///
    /// The restored edge is a new record with a new id.
    pub async fn undo_delete(&self, owner_id: &str, token: &UndoToken) -> LinkResult<LinkEdge> {
        let entry = self
            .take_undo(|e| &e.token == token && e.edge.owner_id == owner_id)
            .await
            .ok_or_else(|| LinkError::NotFound {
                entity: "Undo entry",
                id: token.to_string(),
            })?;
        tracing::debug!("Undoing delete of link {}", entry.edge.id);
        self.create_link(owner_id, entry.edge.to_spec()).await
    }

    /// Restore the owner's most recent deletion
    pub async fn undo_last_delete(&self, owner_id: &str) -> LinkResult<LinkEdge> {
        let entry = self
            .take_undo(|e| e.edge.owner_id == owner_id)
            .await
            .ok_or_else(|| LinkError::NotFound {
                entity: "Undo entry",
                id: owner_id.to_string(),
            })?;
        tracing::debug!("Undoing delete of link {}", entry.edge.id);
        self.create_link(owner_id, entry.edge.to_spec()).await
    }

    /// Number of undo entries that are still within the window
    pub async fn undo_depth(&self, owner_id: &str) -> usize {
        let mut undo = self.undo.lock().await;
        self.expire_undo(&mut undo);
        undo.iter().filter(|e| e.edge.owner_id == owner_id).count()
    }

    // =========================================================================
    // Batch
    // =========================================================================

    /// Create many links in one store call
    ///
    /// Invalid specs fail fast as per-item failures. Valid ones become pending
    /// immediately and are committed or dropped item by item. Only a failure
    /// of the whole call is returned as `Err`, after every pending item has
    /// been rolled back.
    pub async fn batch_create_links(
        &self,
        owner_id: &str,
        specs: Vec<EdgeSpec>,
    ) -> LinkResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut pending: Vec<(usize, EdgeId, EdgeSpec)> = Vec::with_capacity(specs.len());

        for (index, spec) in specs.into_iter().enumerate() {
            match spec.validate() {
                Ok(()) => pending.push((index, self.temporary_id(), spec)),
                Err(e) => outcome.failures.push(BatchFailure {
                    index,
                    spec,
                    error: e.into(),
                }),
            }
        }

        if pending.is_empty() {
            self.report_batch(&outcome);
            return Ok(outcome);
        }

        {
            let mut view = self.view.write().await;
            for (_, temporary, spec) in &pending {
                view.push(CachedEdge::pending(
                    spec.clone().into_edge(temporary.clone(), owner_id),
                ));
            }
        }

        let request: Vec<EdgeSpec> = pending.iter().map(|(_, _, spec)| spec.clone()).collect();
        let results = match self.store.batch_create_edges(owner_id, request).await {
            Ok(results) => results,
            Err(e) => {
                {
                    let mut view = self.view.write().await;
                    for (_, temporary, _) in &pending {
                        Self::remove_in(&mut view, temporary);
                    }
                }
                tracing::warn!("Batch of {} link(s) rolled back: {}", pending.len(), e);
                for (_, temporary, _) in pending {
                    self.notify(EngineNotification::RolledBack {
                        kind: MutationKind::BatchCreate,
                        edge_id: temporary,
                        error: e.clone(),
                    });
                }
                return Err(e);
            }
        };

        let mut results = results.into_iter();
        {
            let mut view = self.view.write().await;
            for (index, temporary, spec) in pending {
                let result = results.next().unwrap_or_else(|| {
                    Err(LinkError::transport("Batch response is missing an item"))
                });
                match result {
                    Ok(edge) => {
                        Self::commit_in(&mut view, &temporary, &edge);
                        outcome.committed.push(edge);
                    }
                    Err(error) => {
                        Self::remove_in(&mut view, &temporary);
                        outcome.failures.push(BatchFailure { index, spec, error });
                    }
                }
            }
        }

        outcome.failures.sort_by_key(|f| f.index);
        self.report_batch(&outcome);
        Ok(outcome)
    }

    fn report_batch(&self, outcome: &BatchOutcome) {
        if outcome.failures.is_empty() {
            tracing::debug!("Batch committed {} link(s)", outcome.committed.len());
            return;
        }
        tracing::warn!(
            "Batch committed {} link(s), {} failed",
            outcome.committed.len(),
            outcome.failures.len()
        );
        self.notify(EngineNotification::BatchPartialFailure {
            committed: outcome.committed.len(),
            failures: outcome.failures.clone(),
        });
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;
