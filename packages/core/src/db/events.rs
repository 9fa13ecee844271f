//! Domain Events for the note and link stores
//!
//! Stores emit these events on a tokio broadcast channel whenever data
//! changes, so that other parts of the system can react without coupling to
//! the storage implementation. The engine's deletion pruner listens for
//! `NoteDeleted` to remove edges of deleted notes.
//!
//! # Event Flow
//!
//! 1. A store performs a data operation (create, delete, ...)
//! 2. The domain event is emitted via the broadcast channel
//! 3. All subscribers receive the event asynchronously

use crate::models::{EdgeId, LinkEdge, Note};
use serde::{Deserialize, Serialize};

/// Broadcast capacity for store events
pub const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Domain events emitted by the stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A new note was created
    #[serde(rename = "note:created")]
    NoteCreated { note: Note },

    /// A note was deleted
    #[serde(rename = "note:deleted", rename_all = "camelCase")]
    NoteDeleted { owner_id: String, id: String },

    /// A link edge was persisted
    #[serde(rename = "link:created")]
    LinkCreated { edge: LinkEdge },

    /// A link edge was removed
    #[serde(rename = "link:deleted", rename_all = "camelCase")]
    LinkDeleted { owner_id: String, id: EdgeId },
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NoteCreated { .. } => "note:created",
            DomainEvent::NoteDeleted { .. } => "note:deleted",
            DomainEvent::LinkCreated { .. } => "link:created",
            DomainEvent::LinkDeleted { .. } => "link:deleted",
        }
    }
}
