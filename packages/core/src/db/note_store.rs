//! NoteStore Trait - note collaborator interface
//!
//! The note CRUD store is owned by another subsystem. This trait is the
//! slice of it the link engine consumes: lookups for resolution and
//! enrichment, inline note creation for "create new note" references, and a
//! domain event stream for deletion pruning.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: all methods are async; the store may be remote
//! 2. **Owner Scoped**: every call names the owner; notes of other owners are invisible
//! 3. **Typed Errors**: methods return `LinkResult` so callers can tell
//!    `NotFound` from `Transport`

use crate::db::events::DomainEvent;
use crate::models::Note;
use crate::services::LinkResult;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Note lookups and inline creation
///
/// Implementations must be `Send + Sync` so that the engine can share them
/// across tasks.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Get a note owned by `owner_id`
    ///
    /// Returns `Ok(None)` when the note does not exist or belongs to another owner.
    async fn get_note(&self, owner_id: &str, id: &str) -> LinkResult<Option<Note>>;

    /// All notes of an owner (used by analytics)
    async fn list_notes(&self, owner_id: &str) -> LinkResult<Vec<Note>>;

    /// Case-insensitive substring search over titles
    async fn search_notes_by_title(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> LinkResult<Vec<Note>>;

    /// Case-insensitive substring search over content
    async fn search_notes_by_content(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> LinkResult<Vec<Note>>;

    /// Most recently created notes first
    async fn recent_notes(&self, owner_id: &str, limit: usize) -> LinkResult<Vec<Note>>;

    /// Whether a slug is already taken by one of the owner's notes
    async fn slug_exists(&self, owner_id: &str, slug: &str) -> LinkResult<bool>;

    /// Create a note
    async fn create_note(
        &self,
        owner_id: &str,
        title: &str,
        slug: &str,
        content: &str,
    ) -> LinkResult<Note>;

    /// Delete a note, emitting `DomainEvent::NoteDeleted`
    ///
    /// Returns whether the note existed.
    async fn delete_note(&self, owner_id: &str, id: &str) -> LinkResult<bool>;

    /// Subscribe to domain events (note created/deleted, link created/deleted)
    fn subscribe(&self) -> broadcast::Receiver<DomainEvent>;
}
