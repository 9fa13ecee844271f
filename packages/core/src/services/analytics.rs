//! Graph Analytics
//!
//! Pure functions over an owner's edge set plus note metadata. Nothing here is
//! cached; callers recompute from a fresh edge list whenever they need a view.

use crate::models::{
    Degree, DegreeCounts, GraphSummary, LinkEdge, Note, NoteSummary, NoteWithDegree, Subgraph,
};
use std::cmp::Ordering;
use std::collections::HashSet;

/// In/out degree of every note that appears in `edges`
///
/// Parallel edges count once each.
pub fn degree_counts(edges: &[LinkEdge]) -> DegreeCounts {
    let mut counts = DegreeCounts::new();
    for edge in edges {
        counts
            .entry(edge.source_note_id.clone())
            .or_default()
            .outgoing += 1;
        counts
            .entry(edge.target_note_id.clone())
            .or_default()
            .incoming += 1;
    }
    counts
}

fn degree_of(counts: &DegreeCounts, note_id: &str) -> Degree {
    counts.get(note_id).copied().unwrap_or_default()
}

/// Higher total degree first, then most recently updated, then id
fn by_degree(a: &NoteWithDegree, b: &NoteWithDegree) -> Ordering {
    b.degree
        .total()
        .cmp(&a.degree.total())
        .then_with(|| b.note.updated_at.cmp(&a.note.updated_at))
        .then_with(|| a.note.id.cmp(&b.note.id))
}

fn ranked_notes(counts: &DegreeCounts, notes: &[Note]) -> Vec<NoteWithDegree> {
    let mut ranked: Vec<NoteWithDegree> = notes
        .iter()
        .map(|n| NoteWithDegree::new(n, degree_of(counts, &n.id)))
        .collect();
    ranked.sort_by(by_degree);
    ranked
}

/// Notes with at least one link, most connected first
pub fn most_connected(edges: &[LinkEdge], notes: &[Note], limit: usize) -> Vec<NoteWithDegree> {
    let counts = degree_counts(edges);
    let mut ranked = ranked_notes(&counts, notes);
    ranked.retain(|n| !n.degree.is_orphan());
    ranked.truncate(limit);
    ranked
}

/// Notes with no incoming and no outgoing links, most recently updated first
pub fn orphans(edges: &[LinkEdge], notes: &[Note]) -> Vec<NoteSummary> {
    let counts = degree_counts(edges);
    let mut found: Vec<&Note> = notes
        .iter()
        .filter(|n| degree_of(&counts, &n.id).is_orphan())
        .collect();
    found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    found.into_iter().map(Note::summary).collect()
}

/// At most `max_nodes` notes, highest degree first, plus the edges among them
pub fn bounded_subgraph(edges: &[LinkEdge], notes: &[Note], max_nodes: usize) -> Subgraph {
    let counts = degree_counts(edges);
    let mut nodes = ranked_notes(&counts, notes);
    nodes.truncate(max_nodes);

    let selected: HashSet<&str> = nodes.iter().map(|n| n.note.id.as_str()).collect();
    let edges = edges
        .iter()
        .filter(|e| {
            selected.contains(e.source_note_id.as_str())
                && selected.contains(e.target_note_id.as_str())
        })
        .cloned()
        .collect();

    Subgraph { nodes, edges }
}

/// Degree map, top `limit` connected notes and orphans
pub fn graph_summary(edges: &[LinkEdge], notes: &[Note], limit: usize) -> GraphSummary {
    GraphSummary {
        degree_counts: degree_counts(edges),
        most_connected: most_connected(edges, notes, limit),
        orphans: orphans(edges, notes),
    }
}
