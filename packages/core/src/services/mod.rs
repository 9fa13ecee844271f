//! Business Services
//!
//! This module contains the link engine's logic:
//!
//! - `ReferenceResolver` / `ResolverSession` - candidate search for open references
//! - `OptimisticCoordinator` - optimistic link mutations with rollback and undo
//! - `analytics` - degree counts, most-connected, orphans, bounded subgraphs
//! - `layout` - deterministic circular placement
//! - `LinkEngine` - the session-scoped facade over all of the above
//!
//! Services coordinate between the database layer and application logic.

pub mod analytics;
mod coordinator;
pub mod error;
pub mod layout;
mod link_engine;
mod pruner;
mod resolver;
mod session;

pub use coordinator::{
    BatchFailure, BatchOutcome, CachedEdge, EngineNotification, MutationKind,
    OptimisticCoordinator, UndoToken,
};
pub use error::{LinkError, LinkResult};
pub use link_engine::LinkEngine;
pub use pruner::DeletionPruner;
pub use resolver::{Candidates, ReferenceResolver, ResolverSession, Selection};
pub use session::{SessionProvider, StaticSession};
