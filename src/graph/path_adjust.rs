//! Path adjustment / shortcut reduction.
//!
//! For each node `x`, an edge `x -> y` at rank `r > 0` is redundant if some
//! `z` in `x`'s retained prefix already reaches `y` at distance `<= d(x,y)`;
//! the direct edge is then removed. Driven by an explicit worklist rather
//! than recursion, so it terminates without relying on the call stack.

use crate::graph::{Edge, NeighbourhoodGraph};
use crate::object_id::ObjectId;

/// Runs one shortcut-reduction pass over every node the graph currently
/// has an entry for. Intended to be run offline (at save time or via an
/// explicit `rebuild`), not on the hot insert path.
pub fn reduce_shortcuts(graph: &NeighbourhoodGraph) {
    for x in graph.live_node_ids() {
        reduce_node(graph, x);
    }
}

fn reduce_node(graph: &NeighbourhoodGraph, x: ObjectId) {
    let list = graph.neighbours(x);
    let edges: Vec<Edge> = list.iter().copied().collect();
    if edges.len() < 2 {
        return;
    }

    let mut worklist: Vec<usize> = (1..edges.len()).collect();
    let mut to_remove = Vec::new();

    while let Some(rank) = worklist.pop() {
        let edge = edges[rank];
        // probe every edge at a strictly lower rank as a candidate `z`
        let has_shortcut = edges[..rank].iter().any(|z| {
            if z.neighbour == edge.neighbour {
                return false;
            }
            let z_list = graph.neighbours(z.neighbour);
            z_list
                .iter()
                .any(|zy| zy.neighbour == edge.neighbour && zy.distance <= edge.distance)
        });
        if has_shortcut {
            to_remove.push(edge.neighbour);
        }
    }

    for neighbour in to_remove {
        graph.remove_edge(x, neighbour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphKind;

    #[test]
    fn removes_edge_when_two_hop_path_is_no_worse() {
        let g = NeighbourhoodGraph::new(GraphKind::Anng);
        // x -> z (rank 0), x -> y (rank 1, distance 5.0)
        // z -> y at distance 4.0 <= 5.0, so x -> y is a removable shortcut.
        g.add_edge(1, Edge::new(2, 1.0)); // x -> z
        g.add_edge(1, Edge::new(3, 5.0)); // x -> y
        g.add_edge(2, Edge::new(3, 4.0)); // z -> y

        reduce_node(&g, 1);
        assert!(!g.neighbours(1).contains(3));
        assert!(g.neighbours(1).contains(2));
    }

    #[test]
    fn keeps_edge_when_no_shorter_path_exists() {
        let g = NeighbourhoodGraph::new(GraphKind::Anng);
        g.add_edge(1, Edge::new(2, 1.0));
        g.add_edge(1, Edge::new(3, 5.0));
        // z -> y exists but is *worse* than the direct edge, so it must stay.
        g.add_edge(2, Edge::new(3, 9.0));

        reduce_node(&g, 1);
        assert!(g.neighbours(1).contains(3));
    }
}
