//! Data Models
//!
//! This module contains the data structures used throughout Notelink:
//!
//! - `Note` / `NoteSummary` - Notes as seen by the link engine
//! - `LinkEdge` / `EdgeSpec` - Directed `[[reference]]` edges and their creation input
//! - Graph views (`Degree`, `Subgraph`, `PositionedNode`, ...) derived from the edge set

mod graph;
mod link;
mod note;

pub use graph::{
    Backlink, Degree, DegreeCounts, GraphSummary, NoteWithDegree, PositionedNode, Subgraph,
    VisualSubgraph,
};
pub use link::{EdgeId, EdgeSpec, LinkEdge, ValidationError, TEMPORARY_ID_PREFIX};
pub use note::{Note, NoteSummary};
