//! Service Layer Error Types
//!
//! This module defines the error taxonomy shared by the link stores, the
//! optimistic coordinator and the engine facade.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Link engine errors
///
/// - `Validation` is raised before any optimistic mutation is applied.
/// - `NotFound` and `Transport` raised by a durable call after an optimistic
///   mutation trigger a rollback of that mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Self-loop, empty target or otherwise malformed request
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Note or edge does not exist, or is not owned by the caller
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Concurrent modification (e.g. deleting an edge that is still being saved)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Durable store unreachable, timed out or failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// No session owner available
    #[error("No authenticated owner for this session")]
    Unauthenticated,
}

impl LinkError {
    /// Create a note not found error
    pub fn note_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Note",
            id: id.into(),
        }
    }

    /// Create an edge not found error
    pub fn edge_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Link",
            id: id.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DatabaseError> for LinkError {
    fn from(err: DatabaseError) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type LinkResult<T> = Result<T, LinkError>;
