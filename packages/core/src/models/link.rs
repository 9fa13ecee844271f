//! Link Edge Data Structures
//!
//! A `LinkEdge` is one directed `[[reference]]` from a source note to a target
//! note. Edges carry denormalized anchor metadata so that they can still be
//! displayed when the target note can no longer be resolved.
//!
//! # Identifiers
//!
//! Durable edges get a UUID from the persistence layer. Edges inserted into a
//! local view before the durable write completes carry a temporary id with the
//! [`TEMPORARY_ID_PREFIX`] prefix until they are reconciled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Prefix used by temporary (optimistic) edge identifiers
pub const TEMPORARY_ID_PREFIX: &str = "optimistic-";

/// Validation errors for link operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Note {note_id} cannot link to itself")]
    SelfLoop { note_id: String },

    #[error("Reference title cannot be empty")]
    EmptyTitle,
}

/// Identifier of a link edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Generate a new durable identifier (UUID v4)
    pub fn durable() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Temporary identifier for an optimistic local record
    pub fn temporary(seq: u64) -> Self {
        Self(format!("{}{}", TEMPORARY_ID_PREFIX, seq))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for creating a link edge
///
/// # Examples
///
/// ```rust
/// use notelink_core::models::EdgeSpec;
///
/// let spec = EdgeSpec::new("note-a", "note-b", "Project Plan", "project-plan")
///     .with_anchor_text("the plan");
/// assert!(spec.validate().is_ok());
///
/// let self_loop = EdgeSpec::new("note-a", "note-a", "A", "a");
/// assert!(self_loop.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub source_note_id: String,
    pub target_note_id: String,
    pub anchor_text: Option<String>,
    pub canonical_title: String,
    pub canonical_slug: String,
}

impl EdgeSpec {
    pub fn new(
        source_note_id: impl Into<String>,
        target_note_id: impl Into<String>,
        canonical_title: impl Into<String>,
        canonical_slug: impl Into<String>,
    ) -> Self {
        Self {
            source_note_id: source_note_id.into(),
            target_note_id: target_note_id.into(),
            anchor_text: None,
            canonical_title: canonical_title.into(),
            canonical_slug: canonical_slug.into(),
        }
    }

    pub fn with_anchor_text(mut self, anchor_text: impl Into<String>) -> Self {
        self.anchor_text = Some(anchor_text.into());
        self
    }

    /// Check the structural invariants of an edge before anything is written
    ///
    /// Ownership and existence of the referenced notes are checked by the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_note_id.trim().is_empty() {
            return Err(ValidationError::MissingField("source_note_id".to_string()));
        }
        if self.target_note_id.trim().is_empty() {
            return Err(ValidationError::MissingField("target_note_id".to_string()));
        }
        if self.source_note_id == self.target_note_id {
            return Err(ValidationError::SelfLoop {
                note_id: self.source_note_id.clone(),
            });
        }
        Ok(())
    }

    /// Materialize this spec into an edge with the given id
    pub fn into_edge(self, id: EdgeId, owner_id: impl Into<String>) -> LinkEdge {
        let now = Utc::now();
        LinkEdge {
            id,
            owner_id: owner_id.into(),
            source_note_id: self.source_note_id,
            target_note_id: self.target_note_id,
            anchor_text: self.anchor_text,
            canonical_title: self.canonical_title,
            canonical_slug: self.canonical_slug,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Directed reference from one note to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEdge {
    pub id: EdgeId,
    pub owner_id: String,
    pub source_note_id: String,
    pub target_note_id: String,
    /// Literal text typed inside the brackets (may differ from the target's title)
    pub anchor_text: Option<String>,
    /// Target title at link-creation time
    pub canonical_title: String,
    /// Target slug at link-creation time
    pub canonical_slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkEdge {
    /// Recover the creation input of this edge (used by undo)
    pub fn to_spec(&self) -> EdgeSpec {
        EdgeSpec {
            source_note_id: self.source_note_id.clone(),
            target_note_id: self.target_note_id.clone(),
            anchor_text: self.anchor_text.clone(),
            canonical_title: self.canonical_title.clone(),
            canonical_slug: self.canonical_slug.clone(),
        }
    }

    pub fn touches(&self, note_id: &str) -> bool {
        self.source_note_id == note_id || self.target_note_id == note_id
    }

    /// Text to show for this link: the anchor when present, else the canonical title
    pub fn display_text(&self) -> &str {
        match self.anchor_text.as_deref() {
            Some(anchor) if !anchor.trim().is_empty() => anchor,
            _ => &self.canonical_title,
        }
    }
}
