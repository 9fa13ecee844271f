//! Link Engine
//!
//! The entry point for one session: resolves references, confirms them into
//! links through the optimistic coordinator, and answers graph queries.
//!
//! Every call resolves the owner from the [`SessionProvider`]; without a
//! signed-in owner calls fail with [`LinkError::Unauthenticated`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use notelink_core::config::EngineConfig;
//! use notelink_core::db::{InMemoryStore, NoteStore};
//! use notelink_core::services::{LinkEngine, Selection, StaticSession};
//! use std::sync::Arc;
//!
//! # async fn example() -> notelink_core::services::LinkResult<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let engine = LinkEngine::new(
//!     store.clone(),
//!     store.clone(),
//!     Arc::new(StaticSession::new("owner-1")),
//!     EngineConfig::default(),
//! );
//!
//! let draft = store.create_note("owner-1", "Draft", "draft", "").await?;
//! let candidates = engine.resolve("Roadmap", Some(&draft.id)).await?;
//! assert!(candidates.offer_create);
//!
//! let edge = engine
//!     .confirm_reference(&draft.id, "Roadmap", Selection::CreateNew { title: "Roadmap".into() })
//!     .await?;
//! assert_eq!(engine.get_backlinks(&edge.target_note_id).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::db::{DomainEvent, LinkStore, NoteStore};
use crate::models::{Backlink, EdgeId, EdgeSpec, GraphSummary, LinkEdge, Note, VisualSubgraph};
use crate::services::analytics::{bounded_subgraph, graph_summary};
use crate::services::layout::layout_subgraph;
use crate::services::{
    BatchFailure, BatchOutcome, CachedEdge, Candidates, DeletionPruner, EngineNotification,
    LinkError, LinkResult, OptimisticCoordinator, ReferenceResolver, ResolverSession, Selection,
    SessionProvider, UndoToken,
};
use crate::utils::extract_references;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct LinkEngine {
    notes: Arc<dyn NoteStore>,
    links: Arc<dyn LinkStore>,
    session: Arc<dyn SessionProvider>,
    resolver: ReferenceResolver,
    coordinator: OptimisticCoordinator,
    config: EngineConfig,
}

impl LinkEngine {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        links: Arc<dyn LinkStore>,
        session: Arc<dyn SessionProvider>,
        config: EngineConfig,
    ) -> Self {
        let resolver = ReferenceResolver::new(notes.clone(), &config);
        let coordinator = OptimisticCoordinator::new(links.clone(), &config);
        Self {
            notes,
            links,
            session,
            resolver,
            coordinator,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn owner(&self) -> LinkResult<String> {
        self.session
            .current_owner_id()
            .ok_or(LinkError::Unauthenticated)
    }

    /// Owner check for calls that name an owner explicitly
    fn owner_matching(&self, owner_id: &str) -> LinkResult<String> {
        let owner = self.owner()?;
        if owner != owner_id {
            return Err(LinkError::NotFound {
                entity: "Graph",
                id: owner_id.to_string(),
            });
        }
        Ok(owner)
    }

    async fn owned_note(&self, owner_id: &str, note_id: &str) -> LinkResult<Note> {
        self.notes
            .get_note(owner_id, note_id)
            .await?
            .ok_or_else(|| LinkError::note_not_found(note_id))
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Candidates for the query of an open `[[` span
    pub async fn resolve(
        &self,
        query: &str,
        exclude_note_id: Option<&str>,
    ) -> LinkResult<Candidates> {
        let owner = self.owner()?;
        Ok(self.resolver.resolve(&owner, query, exclude_note_id).await)
    }

    /// Debounced resolver session for one editor
    pub fn resolver_session(&self, exclude_note_id: Option<String>) -> LinkResult<ResolverSession> {
        let owner = self.owner()?;
        Ok(ResolverSession::new(
            self.resolver.clone(),
            owner,
            exclude_note_id,
            self.config.debounce(),
        ))
    }

    /// Turn a selected candidate into a link from `source_note_id`
    ///
    /// `anchor_text` is the literal text typed inside the brackets.
    /// `CreateNew` creates the target note first.
    pub async fn confirm_reference(
        &self,
        source_note_id: &str,
        anchor_text: &str,
        selection: Selection,
    ) -> LinkResult<LinkEdge> {
        let owner = self.owner()?;
        self.owned_note(&owner, source_note_id).await?;

        let spec = match selection {
            Selection::Existing { note } => {
                EdgeSpec::new(source_note_id, &note.id, &note.title, &note.slug)
            }
            Selection::CreateNew { title } => {
                let note = self.resolver.create_note_for(&owner, &title).await?;
                EdgeSpec::new(source_note_id, &note.id, &note.title, &note.slug)
            }
        };

        let anchor = anchor_text.trim();
        let spec = if anchor.is_empty() {
            spec
        } else {
            spec.with_anchor_text(anchor)
        };

        self.coordinator.create_link(&owner, spec).await
    }

    /// Link every closed `[[Title]]` in `content` from `source_note_id`
    ///
    /// Titles match the owner's notes case-insensitively; unknown titles are
    /// reported as per-item `NotFound` failures.
    pub async fn import_references(
        &self,
        source_note_id: &str,
        content: &str,
    ) -> LinkResult<BatchOutcome> {
        let owner = self.owner()?;
        self.owned_note(&owner, source_note_id).await?;

        let references = extract_references(content);
        if references.is_empty() {
            return Ok(BatchOutcome::default());
        }

        // list_notes is newest first, so the newest note wins a title clash
        let mut by_title: HashMap<String, Note> = HashMap::new();
        for note in self.notes.list_notes(&owner).await? {
            by_title.entry(note.title.to_lowercase()).or_insert(note);
        }

        let mut unresolved = Vec::new();
        let mut specs = Vec::new();
        let mut positions = Vec::new();
        for (index, reference) in references.iter().enumerate() {
            let mut spec = match by_title.get(&reference.title.to_lowercase()) {
                Some(target) => {
                    EdgeSpec::new(source_note_id, &target.id, &target.title, &target.slug)
                }
                None => {
                    unresolved.push(BatchFailure {
                        index,
                        spec: EdgeSpec::new(source_note_id, "", &reference.title, ""),
                        error: LinkError::note_not_found(&reference.title),
                    });
                    continue;
                }
            };
            spec.anchor_text = Some(reference.display_text().to_string());
            specs.push(spec);
            positions.push(index);
        }

        let mut outcome = if specs.is_empty() {
            BatchOutcome::default()
        } else {
            self.coordinator.batch_create_links(&owner, specs).await?
        };

        for failure in &mut outcome.failures {
            failure.index = positions[failure.index];
        }
        outcome.failures.extend(unresolved);
        outcome.failures.sort_by_key(|f| f.index);

        tracing::info!(
            "Imported {} reference(s) into {}: {} linked, {} failed",
            references.len(),
            source_note_id,
            outcome.committed.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    // =========================================================================
    // Link mutations
    // =========================================================================

    pub async fn delete_link(&self, edge_id: &EdgeId) -> LinkResult<Option<UndoToken>> {
        let owner = self.owner()?;
        self.coordinator.delete_link(&owner, edge_id).await
    }

    pub async fn undo_delete(&self, token: &UndoToken) -> LinkResult<LinkEdge> {
        let owner = self.owner()?;
        self.coordinator.undo_delete(&owner, token).await
    }

    pub async fn undo_last_delete(&self) -> LinkResult<LinkEdge> {
        let owner = self.owner()?;
        self.coordinator.undo_last_delete(&owner).await
    }

    /// Reload the local view from the store
    pub async fn load_view(&self) -> LinkResult<usize> {
        let owner = self.owner()?;
        self.coordinator.refresh(&owner).await
    }

    /// Snapshot of the local view, pending edges included
    pub async fn view(&self) -> LinkResult<Vec<CachedEdge>> {
        let owner = self.owner()?;
        Ok(self.coordinator.view(&owner).await)
    }

    /// Rollback, delete and batch notifications
    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.coordinator.subscribe()
    }

    // =========================================================================
    // Graph queries
    // =========================================================================

    /// Incoming links of a note with the linking note's summary
    pub async fn get_backlinks(&self, note_id: &str) -> LinkResult<Vec<Backlink>> {
        let owner = self.owner()?;
        self.owned_note(&owner, note_id).await?;

        let edges = self.links.list_edges_by_target(&owner, note_id).await?;
        let mut sources: HashMap<String, Option<Note>> = HashMap::new();
        let mut backlinks = Vec::with_capacity(edges.len());
        for edge in edges {
            if !sources.contains_key(&edge.source_note_id) {
                let note = self.notes.get_note(&owner, &edge.source_note_id).await?;
                sources.insert(edge.source_note_id.clone(), note);
            }
            match sources.get(&edge.source_note_id).and_then(Option::as_ref) {
                Some(source) => backlinks.push(Backlink {
                    source: source.summary(),
                    edge,
                }),
                None => tracing::debug!(
                    "Skipping backlink {} from missing note {}",
                    edge.id,
                    edge.source_note_id
                ),
            }
        }
        Ok(backlinks)
    }

    pub async fn get_outgoing_links(&self, note_id: &str) -> LinkResult<Vec<LinkEdge>> {
        let owner = self.owner()?;
        self.owned_note(&owner, note_id).await?;
        self.links.list_edges_by_source(&owner, note_id).await
    }

    /// Degree counts, most-connected notes and orphans for `owner_id`
    pub async fn get_graph_summary(&self, owner_id: &str) -> LinkResult<GraphSummary> {
        let owner = self.owner_matching(owner_id)?;
        let edges = self.links.list_edges_for_owner(&owner).await?;
        let notes = self.notes.list_notes(&owner).await?;
        Ok(graph_summary(
            &edges,
            &notes,
            self.config.most_connected_limit,
        ))
    }

    /// Laid-out bounded subgraph; `max_nodes` defaults to the configured size
    pub async fn get_visual_subgraph(
        &self,
        owner_id: &str,
        max_nodes: Option<usize>,
    ) -> LinkResult<VisualSubgraph> {
        let owner = self.owner_matching(owner_id)?;
        let edges = self.links.list_edges_for_owner(&owner).await?;
        let notes = self.notes.list_notes(&owner).await?;
        let max_nodes = max_nodes.unwrap_or(self.config.default_subgraph_size);
        Ok(layout_subgraph(
            bounded_subgraph(&edges, &notes, max_nodes),
            &self.config.layout,
        ))
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Remove every edge whose source or target is `note_id`
    ///
    /// Call after the note is deleted. Returns the number of edges removed.
    pub async fn prune_note(&self, note_id: &str) -> LinkResult<usize> {
        let owner = self.owner()?;
        self.prune_note_for(&owner, note_id).await
    }

    pub(crate) async fn prune_note_for(&self, owner_id: &str, note_id: &str) -> LinkResult<usize> {
        let outgoing = self.links.delete_edges_by_source(owner_id, note_id).await?;
        let incoming = self.links.delete_edges_by_target(owner_id, note_id).await?;
        let evicted = self.coordinator.evict_note(owner_id, note_id).await;
        tracing::debug!(
            "Pruned note {}: {} outgoing, {} incoming, {} evicted from view",
            note_id,
            outgoing,
            incoming,
            evicted
        );
        Ok(outgoing + incoming)
    }

    /// Remove every edge of the current owner whose source or target no
    /// longer exists
    ///
    /// Catches deletions whose events were missed. Returns the number of
    /// edges removed.
    pub async fn prune_dangling(&self) -> LinkResult<usize> {
        let owner = self.owner()?;
        self.prune_dangling_for(&owner).await
    }

    pub(crate) async fn prune_dangling_for(&self, owner_id: &str) -> LinkResult<usize> {
        let live: HashSet<String> = self
            .notes
            .list_notes(owner_id)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();
        let missing: BTreeSet<String> = self
            .links
            .list_edges_for_owner(owner_id)
            .await?
            .into_iter()
            .flat_map(|e| [e.source_note_id, e.target_note_id])
            .filter(|id| !live.contains(id))
            .collect();

        let mut removed = 0;
        for note_id in &missing {
            removed += self.prune_note_for(owner_id, note_id).await?;
        }
        if removed > 0 {
            tracing::info!(
                "Swept {} dangling link(s) across {} missing note(s)",
                removed,
                missing.len()
            );
        }
        Ok(removed)
    }

    pub(crate) fn note_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.notes.subscribe()
    }

    /// Prune edges automatically whenever the note store reports a deletion
    pub fn spawn_deletion_pruner(self: &Arc<Self>) -> DeletionPruner {
        DeletionPruner::spawn(self.clone())
    }

    /// Copy a note's current title and slug onto every edge that targets it
    ///
    /// Renames never propagate on their own; this is the only path that
    /// rewrites canonical fields. Returns the number of edges updated.
    pub async fn propagate_rename(&self, note_id: &str) -> LinkResult<usize> {
        let owner = self.owner()?;
        let note = self.owned_note(&owner, note_id).await?;
        let updated = self
            .links
            .refresh_canonical(&owner, &note.id, &note.title, &note.slug)
            .await?;
        self.coordinator.refresh(&owner).await?;
        tracing::info!(
            "Propagated rename of {} to '{}' across {} link(s)",
            note.id,
            note.title,
            updated
        );
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "link_engine_test.rs"]
mod link_engine_test;
