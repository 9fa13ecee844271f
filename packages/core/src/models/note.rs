//! Note Data Structures
//!
//! Notes are owned by the note store collaborator. The link engine only reads
//! them (for resolution, enrichment and analytics) and creates new ones when a
//! user confirms a "create new note" reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note as seen by the link engine.
///
/// # Fields
///
/// - `id`: Stable identifier (UUID)
/// - `owner_id`: Owning user; notes and links never cross owners
/// - `title`: Display title, matched by `[[Title]]` references
/// - `slug`: URL-safe identifier, unique per owner
/// - `content`: Markdown body
/// - `created_at` / `updated_at`: Timestamps used for recency ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a new note with an auto-generated UUID
    ///
    /// # Examples
    ///
    /// ```rust
    /// use notelink_core::models::Note;
    ///
    /// let note = Note::new("owner-1", "Project Plan", "project-plan", "");
    /// assert_eq!(note.title, "Project Plan");
    /// assert_eq!(note.created_at, note.updated_at);
    /// ```
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            slug: slug.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Lightweight projection used in candidate lists and backlink panels
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            slug: self.slug.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Summary of a note (no content)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        note.summary()
    }
}
