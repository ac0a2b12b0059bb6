//! Edge truncation for `ANNG` graphs.
//!
//! Picks the simpler of two possible policies for handling eviction:
//! truncate by distance to the cap, then for each evicted neighbour probe
//! the retained prefix for a short alternative path and only accept the
//! truncation if one is found; otherwise keep the edge. This is cheaper
//! than a full reachability proof.

use crate::graph::{AdjacencyList, Edge, NeighbourhoodGraph};
use crate::object_id::ObjectId;

/// Maximum hops probed when looking for an alternative path to an evicted
/// neighbour, keeping the cost of truncation bounded.
const MAX_PROBE_HOPS: usize = 2;

/// Reduces `x`'s adjacency list to at most `cap = max(truncation_threshold,
/// edge_size_for_creation)` edges, preserving reachability where
/// affordable to check.
///
/// Only meaningful for [`crate::graph::GraphKind::Anng`]; other kinds
/// either never grow past their cap (ONNG/DNNG) or don't truncate at all
/// (KNNG/BKNNG/IANNG).
pub fn truncate_node(graph: &NeighbourhoodGraph, x: ObjectId, cap: usize) {
    let list = graph.neighbours(x);
    if list.len() <= cap {
        return;
    }

    let edges: Vec<Edge> = list.iter().copied().collect();
    let (retained, candidates) = edges.split_at(cap);
    let mut kept: Vec<Edge> = retained.to_vec();

    for &candidate in candidates {
        if has_alternative_path(graph, &kept, candidate.neighbour, candidate.distance) {
            // a short path exists through a retained neighbour; safe to drop
            continue;
        }
        kept.push(candidate);
    }

    kept.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.neighbour.cmp(&b.neighbour)));
    graph.set_neighbours(x, AdjacencyList::from_sorted_edges(kept));
}

/// True if some node in `retained` reaches `target` within
/// [`MAX_PROBE_HOPS`] at a distance no worse than `direct_distance`.
fn has_alternative_path(
    graph: &NeighbourhoodGraph,
    retained: &[Edge],
    target: ObjectId,
    direct_distance: f32,
) -> bool {
    let mut frontier: Vec<(ObjectId, f32)> = retained.iter().map(|e| (e.neighbour, e.distance)).collect();
    for _ in 0..MAX_PROBE_HOPS {
        let mut next = Vec::new();
        for (node, _) in &frontier {
            let list = graph.neighbours(*node);
            if let Some(edge) = list.iter().find(|e| e.neighbour == target) {
                if edge.distance <= direct_distance {
                    return true;
                }
            }
            for edge in list.iter() {
                next.push((edge.neighbour, edge.distance));
            }
        }
        frontier = next;
    }
    false
}
