//! In-memory store backend
//!
//! Implements both [`NoteStore`] and [`LinkStore`] over `tokio::sync::RwLock`
//! guarded collections. Used by tests and benchmarks, and as a local
//! stand-in for the hosted backend.

use crate::db::events::{DomainEvent, DOMAIN_EVENT_CHANNEL_CAPACITY};
use crate::db::{LinkStore, NoteStore};
use crate::models::{EdgeId, EdgeSpec, LinkEdge, Note};
use crate::services::{LinkError, LinkResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Notes and link edges held in process memory
pub struct InMemoryStore {
    /// Map: note id → note
    notes: RwLock<HashMap<String, Note>>,

    /// Edges in creation order
    edges: RwLock<Vec<LinkEdge>>,

    /// Broadcast channel for domain events
    event_tx: broadcast::Sender<DomainEvent>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            notes: RwLock::new(HashMap::new()),
            edges: RwLock::new(Vec::new()),
            event_tx,
        }
    }

    /// Insert a fully-formed note (keeps its id and timestamps)
    pub async fn insert_note(&self, note: Note) {
        self.notes.write().await.insert(note.id.clone(), note.clone());
        self.emit_event(DomainEvent::NoteCreated { note });
    }

    /// Change a note's title and slug, bumping `updated_at`
    ///
    /// Existing edges keep their canonical snapshot until a rename-propagation
    /// pass runs.
    pub async fn rename_note(
        &self,
        owner_id: &str,
        id: &str,
        title: &str,
        slug: &str,
    ) -> LinkResult<Note> {
        let mut notes = self.notes.write().await;
        let note = notes
            .get_mut(id)
            .filter(|n| n.owner_id == owner_id)
            .ok_or_else(|| LinkError::note_not_found(id))?;
        note.title = title.to_string();
        note.slug = slug.to_string();
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    fn emit_event(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    async fn owned_note_exists(&self, owner_id: &str, id: &str) -> bool {
        self.notes
            .read()
            .await
            .get(id)
            .is_some_and(|n| n.owner_id == owner_id)
    }

    async fn notes_matching<F>(&self, owner_id: &str, limit: usize, matches: F) -> Vec<Note>
    where
        F: Fn(&Note) -> bool + Send,
    {
        let notes = self.notes.read().await;
        let mut found: Vec<Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id && matches(n))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        found.truncate(limit);
        found
    }

    async fn delete_edges_where<F>(&self, owner_id: &str, matches: F) -> usize
    where
        F: Fn(&LinkEdge) -> bool + Send,
    {
        let removed: Vec<LinkEdge> = {
            let mut edges = self.edges.write().await;
            let (removed, kept): (Vec<_>, Vec<_>) = edges
                .drain(..)
                .partition(|e| e.owner_id == owner_id && matches(e));
            *edges = kept;
            removed
        };
        for edge in &removed {
            self.emit_event(DomainEvent::LinkDeleted {
                owner_id: owner_id.to_string(),
                id: edge.id.clone(),
            });
        }
        removed.len()
    }
}

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn get_note(&self, owner_id: &str, id: &str) -> LinkResult<Option<Note>> {
        Ok(self
            .notes
            .read()
            .await
            .get(id)
            .filter(|n| n.owner_id == owner_id)
            .cloned())
    }

    async fn list_notes(&self, owner_id: &str) -> LinkResult<Vec<Note>> {
        Ok(self.notes_matching(owner_id, usize::MAX, |_| true).await)
    }

    async fn search_notes_by_title(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> LinkResult<Vec<Note>> {
        let needle = query.to_lowercase();
        Ok(self
            .notes_matching(owner_id, limit, |n| n.title.to_lowercase().contains(&needle))
            .await)
    }

    async fn search_notes_by_content(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> LinkResult<Vec<Note>> {
        let needle = query.to_lowercase();
        Ok(self
            .notes_matching(owner_id, limit, |n| {
                n.content.to_lowercase().contains(&needle)
            })
            .await)
    }

    async fn recent_notes(&self, owner_id: &str, limit: usize) -> LinkResult<Vec<Note>> {
        let notes = self.notes.read().await;
        let mut found: Vec<Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        found.truncate(limit);
        Ok(found)
    }

    async fn slug_exists(&self, owner_id: &str, slug: &str) -> LinkResult<bool> {
        Ok(self
            .notes
            .read()
            .await
            .values()
            .any(|n| n.owner_id == owner_id && n.slug == slug))
    }

    async fn create_note(
        &self,
        owner_id: &str,
        title: &str,
        slug: &str,
        content: &str,
    ) -> LinkResult<Note> {
        if self.slug_exists(owner_id, slug).await? {
            return Err(LinkError::conflict(format!("Slug '{}' already exists", slug)));
        }
        let note = Note::new(owner_id, title, slug, content);
        self.insert_note(note.clone()).await;
        tracing::debug!("Created note '{}' ({})", note.title, note.id);
        Ok(note)
    }

    async fn delete_note(&self, owner_id: &str, id: &str) -> LinkResult<bool> {
        let existed = {
            let mut notes = self.notes.write().await;
            let owned = notes.get(id).is_some_and(|n| n.owner_id == owner_id);
            if owned {
                notes.remove(id);
            }
            owned
        };
        if existed {
            self.emit_event(DomainEvent::NoteDeleted {
                owner_id: owner_id.to_string(),
                id: id.to_string(),
            });
        }
        Ok(existed)
    }

    fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn create_edge(&self, owner_id: &str, spec: EdgeSpec) -> LinkResult<LinkEdge> {
        spec.validate()?;
        if !self.owned_note_exists(owner_id, &spec.source_note_id).await {
            return Err(LinkError::note_not_found(&spec.source_note_id));
        }
        if !self.owned_note_exists(owner_id, &spec.target_note_id).await {
            return Err(LinkError::note_not_found(&spec.target_note_id));
        }

        let edge = spec.into_edge(EdgeId::durable(), owner_id);
        self.edges.write().await.push(edge.clone());
        self.emit_event(DomainEvent::LinkCreated { edge: edge.clone() });
        Ok(edge)
    }

    async fn delete_edge(&self, owner_id: &str, edge_id: &EdgeId) -> LinkResult<()> {
        {
            let mut edges = self.edges.write().await;
            let position = edges
                .iter()
                .position(|e| &e.id == edge_id && e.owner_id == owner_id)
                .ok_or_else(|| LinkError::edge_not_found(edge_id.as_str()))?;
            edges.remove(position);
        }
        self.emit_event(DomainEvent::LinkDeleted {
            owner_id: owner_id.to_string(),
            id: edge_id.clone(),
        });
        Ok(())
    }

    async fn list_edges_for_owner(&self, owner_id: &str) -> LinkResult<Vec<LinkEdge>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_edges_by_source(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> LinkResult<Vec<LinkEdge>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| e.owner_id == owner_id && e.source_note_id == note_id)
            .cloned()
            .collect())
    }

    async fn list_edges_by_target(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> LinkResult<Vec<LinkEdge>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| e.owner_id == owner_id && e.target_note_id == note_id)
            .cloned()
            .collect())
    }

    async fn delete_edges_by_source(&self, owner_id: &str, note_id: &str) -> LinkResult<usize> {
        Ok(self
            .delete_edges_where(owner_id, |e| e.source_note_id == note_id)
            .await)
    }

    async fn delete_edges_by_target(&self, owner_id: &str, note_id: &str) -> LinkResult<usize> {
        Ok(self
            .delete_edges_where(owner_id, |e| e.target_note_id == note_id)
            .await)
    }

    async fn refresh_canonical(
        &self,
        owner_id: &str,
        target_id: &str,
        title: &str,
        slug: &str,
    ) -> LinkResult<usize> {
        let mut edges = self.edges.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for edge in edges
            .iter_mut()
            .filter(|e| e.owner_id == owner_id && e.target_note_id == target_id)
        {
            edge.canonical_title = title.to_string();
            edge.canonical_slug = slug.to_string();
            edge.updated_at = now;
            updated += 1;
        }
        Ok(updated)
    }
}
