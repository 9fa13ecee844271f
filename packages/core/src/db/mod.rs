//! Database Layer
//!
//! This module holds the persistence side of the link engine:
//!
//! - [`LinkStore`] - durable owner-scoped CRUD over link edges
//! - [`NoteStore`] - the slice of the note collaborator the engine consumes
//! - [`InMemoryStore`] - both traits over in-process collections
//! - [`LibsqlStore`] - both traits over an embedded libsql database
//! - [`DomainEvent`] - change notifications broadcast by the stores

mod database;
mod error;
pub mod events;
mod libsql_store;
mod link_store;
mod memory_store;
mod note_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use events::DomainEvent;
pub use libsql_store::LibsqlStore;
pub use link_store::LinkStore;
pub use memory_store::InMemoryStore;
pub use note_store::NoteStore;
