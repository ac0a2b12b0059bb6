//! Per-[`super::GraphKind`] insertion policies.
//!
//! The common prologue — running the searcher to collect candidate
//! neighbours for a freshly-stored object — lives in
//! [`crate::index`], which owns both the graph and the searcher; this
//! module only encodes what happens to the adjacency lists once the
//! searcher's candidate list, already distance-sorted, lands in hand.

use crate::graph::truncation::truncate_node;
use crate::graph::{Edge, GraphKind, NeighbourhoodGraph};
use crate::object_id::ObjectId;

/// Tunables consulted while integrating a new node, mirroring
/// `IndexFacade`'s recognised options.
#[derive(Debug, Clone, Copy)]
pub struct InsertionPolicy {
    /// `edge_size_for_creation`.
    pub edge_size_for_creation: usize,
    /// `edge_size_limit_for_creation`.
    pub edge_size_limit_for_creation: usize,
    /// `truncation_threshold`.
    pub truncation_threshold: usize,
    /// For ONNG: outgoing cap.
    pub outgoing_edge: usize,
    /// For ONNG: incoming cap (number of candidates that get a reverse edge).
    pub incoming_edge: usize,
}

impl Default for InsertionPolicy {
    fn default() -> Self {
        Self {
            edge_size_for_creation: 10,
            edge_size_limit_for_creation: 5,
            truncation_threshold: 50,
            outgoing_edge: 10,
            incoming_edge: 10,
        }
    }
}

/// Integrates `x` into `graph`, given `candidates` (already
/// distance-sorted, from the searcher run with `insertion_epsilon`) per
/// `graph.kind()`'s policy.
pub fn integrate(
    graph: &NeighbourhoodGraph,
    x: ObjectId,
    candidates: &[Edge],
    policy: &InsertionPolicy,
) {
    graph.ensure_node(x);
    match graph.kind() {
        GraphKind::Anng => integrate_anng(graph, x, candidates, policy),
        GraphKind::Ianng => integrate_ianng(graph, x, candidates, policy),
        GraphKind::Onng | GraphKind::Dnng => integrate_onng(graph, x, candidates, policy),
        GraphKind::Knng => integrate_knng(graph, x, candidates, policy),
        GraphKind::Bknng => integrate_bknng(graph, x, candidates, policy),
    }
}

fn take_for_creation<'a>(candidates: &'a [Edge], policy: &InsertionPolicy) -> &'a [Edge] {
    &candidates[..candidates.len().min(policy.edge_size_for_creation)]
}

fn integrate_anng(graph: &NeighbourhoodGraph, x: ObjectId, candidates: &[Edge], policy: &InsertionPolicy) {
    for &edge in take_for_creation(candidates, policy) {
        graph.add_edge(x, edge);
        let reverse = Edge::new(x, edge.distance);
        graph.add_edge(edge.neighbour, reverse);
        if graph.neighbours(edge.neighbour).len() > policy.truncation_threshold {
            let cap = policy.truncation_threshold.max(policy.edge_size_for_creation);
            truncate_node(graph, edge.neighbour, cap);
        }
    }
}

fn integrate_ianng(graph: &NeighbourhoodGraph, x: ObjectId, candidates: &[Edge], policy: &InsertionPolicy) {
    for &edge in take_for_creation(candidates, policy) {
        graph.add_edge(x, edge);
        let c = edge.neighbour;
        let c_list = graph.neighbours(c);
        if c_list.len() >= policy.edge_size_for_creation.saturating_sub(1) {
            if let Some(worst) = c_list.worst().copied() {
                graph.remove_edge(c, worst.neighbour);
                graph.remove_edge(worst.neighbour, c);
            }
        }
        graph.add_edge(c, Edge::new(x, edge.distance));
    }
}

fn integrate_onng(graph: &NeighbourhoodGraph, x: ObjectId, candidates: &[Edge], policy: &InsertionPolicy) {
    let outgoing = &candidates[..candidates.len().min(policy.outgoing_edge)];
    for &edge in outgoing {
        graph.add_edge(x, edge);
    }
    let incoming = &candidates[..candidates.len().min(policy.incoming_edge)];
    for &edge in incoming {
        graph.add_edge(edge.neighbour, Edge::new(x, edge.distance));
    }
}

fn integrate_knng(graph: &NeighbourhoodGraph, x: ObjectId, candidates: &[Edge], policy: &InsertionPolicy) {
    for &edge in take_for_creation(candidates, policy) {
        graph.add_edge(x, edge);
    }
}

fn integrate_bknng(graph: &NeighbourhoodGraph, x: ObjectId, candidates: &[Edge], policy: &InsertionPolicy) {
    for &edge in take_for_creation(candidates, policy) {
        graph.add_edge(x, edge);
        graph.add_edge(edge.neighbour, Edge::new(x, edge.distance));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anng_adds_reverse_edges() {
        let g = NeighbourhoodGraph::new(GraphKind::Anng);
        g.ensure_node(2);
        let policy = InsertionPolicy::default();
        integrate(&g, 1, &[Edge::new(2, 1.0)], &policy);
        assert!(g.neighbours(1).contains(2));
        assert!(g.neighbours(2).contains(1));
    }

    #[test]
    fn knng_only_adds_outgoing() {
        let g = NeighbourhoodGraph::new(GraphKind::Knng);
        g.ensure_node(2);
        let policy = InsertionPolicy::default();
        integrate(&g, 1, &[Edge::new(2, 1.0)], &policy);
        assert!(g.neighbours(1).contains(2));
        assert!(!g.neighbours(2).contains(1));
    }

    #[test]
    fn onng_respects_outgoing_and_incoming_caps() {
        let g = NeighbourhoodGraph::new(GraphKind::Onng);
        for n in 2..=5u32 {
            g.ensure_node(n);
        }
        let policy = InsertionPolicy {
            outgoing_edge: 2,
            incoming_edge: 1,
            ..Default::default()
        };
        let candidates: Vec<Edge> = (2..=5u32).map(|n| Edge::new(n, f32::from(n))).collect();
        integrate(&g, 1, &candidates, &policy);
        assert_eq!(g.neighbours(1).len(), 2);
        let incoming_count = (2..=5u32).filter(|&n| g.neighbours(n).contains(1)).count();
        assert_eq!(incoming_count, 1);
    }
}
