//! Notelink Core: bracket-reference resolution and backlink graph engine
//!
//! This crate turns `[[Title]]` references typed inside notes into a
//! persisted, owner-scoped directed graph of note-to-note links, keeps a local
//! optimistic view of that graph consistent with the store, and derives
//! backlink lists, graph summaries and laid-out subgraphs from it.
//!
//! # Architecture
//!
//! - **Stateless detection**: every keystroke re-derives the open span
//! - **Optimistic writes**: the local view changes first, then reconciles or rolls back
//! - **Recomputed analytics**: derived views are pure functions of the edge set
//! - **libsql**: embedded SQLite-compatible persistence; an in-memory store for tests
//!
//! # Modules
//!
//! - [`detection`] - Open `[[` and `#` span detection
//! - [`models`] - Data structures (Note, LinkEdge, graph views)
//! - [`services`] - Resolver, coordinator, analytics, layout and the engine facade
//! - [`db`] - Store traits and the in-memory and libsql backends
//! - [`config`] - Engine configuration
//! - [`utils`] - Markdown stripping, reference extraction and slugs

pub mod config;
pub mod db;
pub mod detection;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{EngineConfig, LayoutConfig};
pub use detection::*;
pub use models::*;
pub use services::*;
