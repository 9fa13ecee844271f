//! LinkStore Trait - durable link edge persistence
//!
//! This module defines the `LinkStore` trait, the durable directed-edge record
//! set behind the optimistic coordinator. Two backends implement it:
//! [`InMemoryStore`](crate::db::InMemoryStore) and
//! [`LibsqlStore`](crate::db::LibsqlStore).
//!
//! # Contract
//!
//! - All operations are scoped by `owner_id`; edges never cross owners.
//! - `create_edge` rejects self-loops with `Validation` and unknown notes with `NotFound`.
//! - `delete_edge` is not idempotent: deleting an absent edge fails with `NotFound`.
//! - `batch_create_edges` reports per-item outcomes; one bad reference does
//!   not fail the others. The outer `Result` only fails for whole-call
//!   transport errors.
//!
//! # Examples
//!
//! ```rust,no_run
//! use notelink_core::db::{InMemoryStore, LinkStore, NoteStore};
//! use notelink_core::models::EdgeSpec;
//!
//! # async fn example() -> notelink_core::services::LinkResult<()> {
//! let store = InMemoryStore::new();
//! let a = store.create_note("owner", "A", "a", "").await?;
//! let b = store.create_note("owner", "B", "b", "").await?;
//!
//! let edge = store
//!     .create_edge("owner", EdgeSpec::new(&a.id, &b.id, &b.title, &b.slug))
//!     .await?;
//! assert_eq!(store.list_edges_by_target("owner", &b.id).await?, vec![edge]);
//! # Ok(())
//! # }
//! ```

use crate::models::{EdgeId, EdgeSpec, LinkEdge};
use crate::services::{LinkError, LinkResult};
use async_trait::async_trait;

/// Durable CRUD over `LinkEdge` records
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Persist a new edge and return it with its durable id
    async fn create_edge(&self, owner_id: &str, spec: EdgeSpec) -> LinkResult<LinkEdge>;

    /// Delete an edge owned by `owner_id`
    async fn delete_edge(&self, owner_id: &str, edge_id: &EdgeId) -> LinkResult<()>;

    /// Every edge of one owner, oldest first
    async fn list_edges_for_owner(&self, owner_id: &str) -> LinkResult<Vec<LinkEdge>>;

    /// Outgoing edges of a note
    async fn list_edges_by_source(&self, owner_id: &str, note_id: &str)
        -> LinkResult<Vec<LinkEdge>>;

    /// Incoming edges of a note (backlinks)
    async fn list_edges_by_target(&self, owner_id: &str, note_id: &str)
        -> LinkResult<Vec<LinkEdge>>;

    /// Create many edges, reporting each outcome in input order
    ///
    /// The default implementation creates edges one by one.
    async fn batch_create_edges(
        &self,
        owner_id: &str,
        specs: Vec<EdgeSpec>,
    ) -> LinkResult<Vec<LinkResult<LinkEdge>>> {
        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = self.create_edge(owner_id, spec).await;
            if let Err(LinkError::Transport(msg)) = &result {
                tracing::warn!("Batch item failed with transport error: {}", msg);
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Remove every edge whose source is `note_id`; returns the number removed
    async fn delete_edges_by_source(&self, owner_id: &str, note_id: &str) -> LinkResult<usize>;

    /// Remove every edge whose target is `note_id`; returns the number removed
    async fn delete_edges_by_target(&self, owner_id: &str, note_id: &str) -> LinkResult<usize>;

    /// Overwrite the canonical title/slug snapshot of every edge pointing at `target_id`
    ///
    /// Only called by the explicit rename-propagation pass.
    async fn refresh_canonical(
        &self,
        owner_id: &str,
        target_id: &str,
        title: &str,
        slug: &str,
    ) -> LinkResult<usize>;
}
