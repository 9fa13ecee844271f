//! libsql store backend
//!
//! Implements [`NoteStore`] and [`LinkStore`] on top of [`DatabaseService`].
//! Timestamps are stored as RFC 3339 text with fixed microsecond precision so
//! that lexical ordering matches chronological ordering.

use crate::db::database::DatabaseService;
use crate::db::error::DatabaseError;
use crate::db::events::{DomainEvent, DOMAIN_EVENT_CHANNEL_CAPACITY};
use crate::db::{LinkStore, NoteStore};
use crate::models::{EdgeId, EdgeSpec, LinkEdge, Note};
use crate::services::{LinkError, LinkResult};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::params;
use std::path::PathBuf;
use tokio::sync::broadcast;

const NOTE_COLUMNS: &str = "id, owner_id, title, slug, content, created_at, updated_at";
const LINK_COLUMNS: &str = "id, owner_id, source_note_id, target_note_id, anchor_text, \
                            canonical_title, canonical_slug, created_at, updated_at";

/// Notes and links persisted in a libsql database
pub struct LibsqlStore {
    db: DatabaseService,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl LibsqlStore {
    /// Open the database at `db_path`, creating it if needed
    pub async fn open(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let db = DatabaseService::new(db_path).await?;
        Ok(Self::from_service(db))
    }

    pub fn from_service(db: DatabaseService) -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self { db, event_tx }
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn query_notes(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Note>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Note query failed: {}", e)))?;

        let mut notes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            notes.push(row_to_note(&row)?);
        }
        Ok(notes)
    }

    async fn query_links(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<LinkEdge>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Link query failed: {}", e)))?;

        let mut links = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            links.push(row_to_link(&row)?);
        }
        Ok(links)
    }

    async fn execute(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Statement failed: {}", e)))
    }

    /// Owner's notes matching `matches`, most recently updated first
    ///
    /// SQLite's `LOWER` and `LIKE` only fold ASCII, so case-insensitive
    /// matching happens here with Unicode lowercasing.
    async fn notes_matching<F>(
        &self,
        owner_id: &str,
        limit: usize,
        matches: F,
    ) -> Result<Vec<Note>, DatabaseError>
    where
        F: Fn(&Note) -> bool + Send,
    {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = ? ORDER BY updated_at DESC, id",
            NOTE_COLUMNS
        );
        Ok(self
            .query_notes(&sql, params![owner_id])
            .await?
            .into_iter()
            .filter(|n| matches(n))
            .take(limit)
            .collect())
    }

    async fn owned_note_exists(&self, owner_id: &str, id: &str) -> LinkResult<bool> {
        Ok(self.get_note(owner_id, id).await?.is_some())
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
        let now = format_timestamp(&Utc::now());
        let affected = self
            .execute(
                "UPDATE notes SET title = ?, slug = ?, updated_at = ? WHERE owner_id = ? AND id = ?",
                params![title, slug, now.as_str(), owner_id, id],
            )
            .await?;
        if affected == 0 {
            return Err(LinkError::note_not_found(id));
        }
        self.get_note(owner_id, id)
            .await?
            .ok_or_else(|| LinkError::note_not_found(id))
    }
}

#[async_trait]
impl NoteStore for LibsqlStore {
    async fn get_note(&self, owner_id: &str, id: &str) -> LinkResult<Option<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = ? AND id = ?",
            NOTE_COLUMNS
        );
        Ok(self.query_notes(&sql, params![owner_id, id]).await?.into_iter().next())
    }

    async fn list_notes(&self, owner_id: &str) -> LinkResult<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = ? ORDER BY updated_at DESC, id",
            NOTE_COLUMNS
        );
        Ok(self.query_notes(&sql, params![owner_id]).await?)
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
            .await?)
    }

    async fn search_notes_by_content(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> LinkResult<Vec<Note>> {
        let needle = query.to_lowercase();
        Ok(self
            .notes_matching(owner_id, limit, |n| n.content.to_lowercase().contains(&needle))
            .await?)
    }

    async fn recent_notes(&self, owner_id: &str, limit: usize) -> LinkResult<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = ? ORDER BY created_at DESC, id LIMIT ?",
            NOTE_COLUMNS
        );
        Ok(self.query_notes(&sql, params![owner_id, limit as i64]).await?)
    }

    async fn slug_exists(&self, owner_id: &str, slug: &str) -> LinkResult<bool> {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = ? AND slug = ?",
            NOTE_COLUMNS
        );
        Ok(!self.query_notes(&sql, params![owner_id, slug]).await?.is_empty())
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
        self.execute(
            "INSERT INTO notes (id, owner_id, title, slug, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                note.id.as_str(),
                note.owner_id.as_str(),
                note.title.as_str(),
                note.slug.as_str(),
                note.content.as_str(),
                format_timestamp(&note.created_at),
                format_timestamp(&note.updated_at),
            ],
        )
        .await?;

        self.emit_event(DomainEvent::NoteCreated { note: note.clone() });
        Ok(note)
    }

    async fn delete_note(&self, owner_id: &str, id: &str) -> LinkResult<bool> {
        let affected = self
            .execute(
                "DELETE FROM notes WHERE owner_id = ? AND id = ?",
                params![owner_id, id],
            )
            .await?;

        let existed = affected > 0;
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
impl LinkStore for LibsqlStore {
    async fn create_edge(&self, owner_id: &str, spec: EdgeSpec) -> LinkResult<LinkEdge> {
        spec.validate()?;
        if !self.owned_note_exists(owner_id, &spec.source_note_id).await? {
            return Err(LinkError::note_not_found(&spec.source_note_id));
        }
        if !self.owned_note_exists(owner_id, &spec.target_note_id).await? {
            return Err(LinkError::note_not_found(&spec.target_note_id));
        }

        let edge = spec.into_edge(EdgeId::durable(), owner_id);
        let sql = format!(
            "INSERT INTO note_links ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            LINK_COLUMNS
        );
        self.execute(
            &sql,
            params![
                edge.id.as_str(),
                edge.owner_id.as_str(),
                edge.source_note_id.as_str(),
                edge.target_note_id.as_str(),
                match &edge.anchor_text {
                    Some(text) => libsql::Value::Text(text.clone()),
                    None => libsql::Value::Null,
                },
                edge.canonical_title.as_str(),
                edge.canonical_slug.as_str(),
                format_timestamp(&edge.created_at),
                format_timestamp(&edge.updated_at),
            ],
        )
        .await?;

        self.emit_event(DomainEvent::LinkCreated { edge: edge.clone() });
        Ok(edge)
    }

    async fn delete_edge(&self, owner_id: &str, edge_id: &EdgeId) -> LinkResult<()> {
        let affected = self
            .execute(
                "DELETE FROM note_links WHERE owner_id = ? AND id = ?",
                params![owner_id, edge_id.as_str()],
            )
            .await?;

        if affected == 0 {
            return Err(LinkError::edge_not_found(edge_id.as_str()));
        }

        self.emit_event(DomainEvent::LinkDeleted {
            owner_id: owner_id.to_string(),
            id: edge_id.clone(),
        });
        Ok(())
    }

    async fn list_edges_for_owner(&self, owner_id: &str) -> LinkResult<Vec<LinkEdge>> {
        let sql = format!(
            "SELECT {} FROM note_links WHERE owner_id = ? ORDER BY created_at, rowid",
            LINK_COLUMNS
        );
        Ok(self.query_links(&sql, params![owner_id]).await?)
    }

    async fn list_edges_by_source(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> LinkResult<Vec<LinkEdge>> {
        let sql = format!(
            "SELECT {} FROM note_links WHERE owner_id = ? AND source_note_id = ? \
             ORDER BY created_at, rowid",
            LINK_COLUMNS
        );
        Ok(self.query_links(&sql, params![owner_id, note_id]).await?)
    }

    async fn list_edges_by_target(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> LinkResult<Vec<LinkEdge>> {
        let sql = format!(
            "SELECT {} FROM note_links WHERE owner_id = ? AND target_note_id = ? \
             ORDER BY created_at, rowid",
            LINK_COLUMNS
        );
        Ok(self.query_links(&sql, params![owner_id, note_id]).await?)
    }

    async fn delete_edges_by_source(&self, owner_id: &str, note_id: &str) -> LinkResult<usize> {
        let removed = self.list_edges_by_source(owner_id, note_id).await?;
        self.execute(
            "DELETE FROM note_links WHERE owner_id = ? AND source_note_id = ?",
            params![owner_id, note_id],
        )
        .await?;
        for edge in &removed {
            self.emit_event(DomainEvent::LinkDeleted {
                owner_id: owner_id.to_string(),
                id: edge.id.clone(),
            });
        }
        Ok(removed.len())
    }

    async fn delete_edges_by_target(&self, owner_id: &str, note_id: &str) -> LinkResult<usize> {
        let removed = self.list_edges_by_target(owner_id, note_id).await?;
        self.execute(
            "DELETE FROM note_links WHERE owner_id = ? AND target_note_id = ?",
            params![owner_id, note_id],
        )
        .await?;
        for edge in &removed {
            self.emit_event(DomainEvent::LinkDeleted {
                owner_id: owner_id.to_string(),
                id: edge.id.clone(),
            });
        }
        Ok(removed.len())
    }

    async fn refresh_canonical(
        &self,
        owner_id: &str,
        target_id: &str,
        title: &str,
        slug: &str,
    ) -> LinkResult<usize> {
        let now = format_timestamp(&Utc::now());
        let affected = self
            .execute(
                "UPDATE note_links SET canonical_title = ?, canonical_slug = ?, updated_at = ?
                 WHERE owner_id = ? AND target_note_id = ?",
                params![title, slug, now.as_str(), owner_id, target_id],
            )
            .await?;
        Ok(affected as usize)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::corrupt_row(format!("Invalid timestamp '{}': {}", s, e)))
}

fn text_column(row: &libsql::Row, idx: i32) -> Result<String, DatabaseError> {
    row.get::<String>(idx)
        .map_err(|e| DatabaseError::corrupt_row(format!("Column {}: {}", idx, e)))
}

fn nullable_text_column(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row
        .get_value(idx)
        .map_err(|e| DatabaseError::corrupt_row(format!("Column {}: {}", idx, e)))?
    {
        libsql::Value::Null => Ok(None),
        libsql::Value::Text(text) => Ok(Some(text)),
        other => Err(DatabaseError::corrupt_row(format!(
            "Column {}: expected text, found {:?}",
            idx, other
        ))),
    }
}

fn row_to_note(row: &libsql::Row) -> Result<Note, DatabaseError> {
    Ok(Note {
        id: text_column(row, 0)?,
        owner_id: text_column(row, 1)?,
        title: text_column(row, 2)?,
        slug: text_column(row, 3)?,
        content: text_column(row, 4)?,
        created_at: parse_timestamp(&text_column(row, 5)?)?,
        updated_at: parse_timestamp(&text_column(row, 6)?)?,
    })
}

fn row_to_link(row: &libsql::Row) -> Result<LinkEdge, DatabaseError> {
    Ok(LinkEdge {
        id: EdgeId::from(text_column(row, 0)?),
        owner_id: text_column(row, 1)?,
        source_note_id: text_column(row, 2)?,
        target_note_id: text_column(row, 3)?,
        anchor_text: nullable_text_column(row, 4)?,
        canonical_title: text_column(row, 5)?,
        canonical_slug: text_column(row, 6)?,
        created_at: parse_timestamp(&text_column(row, 7)?)?,
        updated_at: parse_timestamp(&text_column(row, 8)?)?,
    })
}
