//! Circular network layout
//!
//! Node `i` of `n` sits at angle `i * 2π / n` on a circle around a fixed
//! center. The same input always produces the same output.

use crate::config::LayoutConfig;
use crate::models::{NoteWithDegree, PositionedNode, Subgraph, VisualSubgraph};
use std::f64::consts::TAU;

pub const MIN_NODE_SIZE: f64 = 8.0;
pub const MAX_NODE_SIZE: f64 = 20.0;

/// Visual size for a node of the given total degree
pub fn node_size(degree: usize) -> f64 {
    (degree as f64 * 2.0).clamp(MIN_NODE_SIZE, MAX_NODE_SIZE)
}

/// Place `nodes` evenly on a circle, in input order
pub fn layout_circular(nodes: &[NoteWithDegree], config: &LayoutConfig) -> Vec<PositionedNode> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let step = TAU / nodes.len() as f64;
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let angle = i as f64 * step;
            let degree = node.degree.total();
            PositionedNode {
                note_id: node.note.id.clone(),
                title: node.note.title.clone(),
                degree,
                x: config.center_x + config.radius * angle.cos(),
                y: config.center_y + config.radius * angle.sin(),
                size: node_size(degree),
            }
        })
        .collect()
}

/// Lay out a bounded subgraph, keeping its edges
pub fn layout_subgraph(subgraph: Subgraph, config: &LayoutConfig) -> VisualSubgraph {
    VisualSubgraph {
        nodes: layout_circular(&subgraph.nodes, config),
        edges: subgraph.edges,
    }
}
