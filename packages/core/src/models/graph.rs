//! Derived graph views
//!
//! These types are produced by the analytics and layout functions. None of
//! them is stored; they are recomputed from an owner's edge set on demand.

use crate::models::{LinkEdge, Note, NoteSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In/out degree of a single note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Degree {
    pub incoming: usize,
    pub outgoing: usize,
}

impl Degree {
    pub fn total(&self) -> usize {
        self.incoming + self.outgoing
    }

    pub fn is_orphan(&self) -> bool {
        self.total() == 0
    }
}

/// Degree map keyed by note id. Notes absent from the map have degree zero.
pub type DegreeCounts = HashMap<String, Degree>;

/// A note summary annotated with its degree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithDegree {
    pub note: NoteSummary,
    pub degree: Degree,
}

impl NoteWithDegree {
    pub fn new(note: &Note, degree: Degree) -> Self {
        Self {
            note: note.summary(),
            degree,
        }
    }
}

/// Size-limited selection of notes and the edges among them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgraph {
    pub nodes: Vec<NoteWithDegree>,
    pub edges: Vec<LinkEdge>,
}

/// A node placed for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub note_id: String,
    pub title: String,
    pub degree: usize,
    pub x: f64,
    pub y: f64,
    /// Visual radius derived from degree
    pub size: f64,
}

/// Laid-out bounded subgraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSubgraph {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LinkEdge>,
}

/// Per-owner graph summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub degree_counts: DegreeCounts,
    pub most_connected: Vec<NoteWithDegree>,
    pub orphans: Vec<NoteSummary>,
}

/// An incoming link enriched with the note it comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlink {
    pub edge: LinkEdge,
    pub source: NoteSummary,
}
