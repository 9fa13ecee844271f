//! Database Service
//!
//! Connection management and schema initialization for the libsql backend.
//!
//! # Schema
//!
//! - `notes`: the owner-scoped notes the engine resolves references against
//! - `note_links`: owner-scoped directed link edges with anchor text and the
//!   canonical title/slug snapshot of the target
//!
//! # Connections
//!
//! Use [`DatabaseService::connect_with_timeout`] in async code. It sets a busy
//! timeout on every connection so that concurrent operations wait instead of
//! failing on a locked database.

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use notelink_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("./data/notelink.db")).await?;
///     let _conn = db_service.connect_with_timeout().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// This will:
    /// 1. Ensure the parent directory exists
    /// 2. Open/create the database file
    /// 3. Create tables and indexes (idempotent)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };
        service.initialize_schema().await?;

        tracing::info!("Link database ready at {}", service.db_path.display());
        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes using CREATE ... IF NOT EXISTS
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                slug TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (owner_id, slug)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create notes table: {}", e))
        })?;

        // Multiple edges per (source, target) pair are allowed; only id is unique
        conn.execute(
            "CREATE TABLE IF NOT EXISTS note_links (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                source_note_id TEXT NOT NULL,
                target_note_id TEXT NOT NULL,
                anchor_text TEXT,
                canonical_title TEXT NOT NULL,
                canonical_slug TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (source_note_id <> target_note_id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create note_links table: {}",
                e
            ))
        })?;

        for (name, ddl) in [
            (
                "idx_notes_owner_created",
                "CREATE INDEX IF NOT EXISTS idx_notes_owner_created ON notes(owner_id, created_at)",
            ),
            (
                "idx_links_owner",
                "CREATE INDEX IF NOT EXISTS idx_links_owner ON note_links(owner_id)",
            ),
            (
                "idx_links_source",
                "CREATE INDEX IF NOT EXISTS idx_links_source ON note_links(owner_id, source_note_id)",
            ),
            (
                "idx_links_target",
                "CREATE INDEX IF NOT EXISTS idx_links_target ON note_links(owner_id, target_note_id)",
            ),
        ] {
            conn.execute(ddl, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create index '{}': {}",
                    name, e
                ))
            })?;
        }

        Ok(())
    }

    /// Get a synchronous connection handle
    ///
    /// Prefer [`connect_with_timeout`](Self::connect_with_timeout) in async code.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with a 5 second busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        Ok(conn)
    }
}
