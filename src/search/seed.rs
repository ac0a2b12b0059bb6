//! `SeedProvider`: picks the initial frontier nodes a search starts from.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::NeighbourhoodGraph;
use crate::object_id::ObjectId;

/// §9 leaves `seed_size` unset behaviour to an implementer sentinel; the
/// original uses `10`, adopted here unchanged.
pub const DEFAULT_RANDOM_SEED_SIZE: usize = 10;

/// Produces the initial seed set for a search.
pub trait SeedProvider {
    /// Returns up to `seed_size` node ids to seed the frontier with.
    fn seeds(&self, graph: &NeighbourhoodGraph, seed_size: usize, rng: &mut impl Rng) -> Vec<ObjectId>;
}

/// `seed_kind = None`: caller must supply explicit seeds (e.g. entry point
/// tracked elsewhere); this provider always returns nothing.
pub struct NoSeeds;

impl SeedProvider for NoSeeds {
    fn seeds(&self, _graph: &NeighbourhoodGraph, _seed_size: usize, _rng: &mut impl Rng) -> Vec<ObjectId> {
        Vec::new()
    }
}

/// `seed_kind = Random`: `seed_size` distinct live nodes chosen uniformly
/// at random.
pub struct RandomSeeds;

impl SeedProvider for RandomSeeds {
    fn seeds(&self, graph: &NeighbourhoodGraph, seed_size: usize, rng: &mut impl Rng) -> Vec<ObjectId> {
        let mut ids = graph.live_node_ids();
        ids.shuffle(rng);
        ids.truncate(seed_size);
        ids
    }
}

/// `seed_kind = Fixed`: a caller-supplied, unchanging set of ids.
pub struct FixedSeeds(pub Vec<ObjectId>);

impl SeedProvider for FixedSeeds {
    fn seeds(&self, _graph: &NeighbourhoodGraph, seed_size: usize, _rng: &mut impl Rng) -> Vec<ObjectId> {
        self.0.iter().copied().take(seed_size).collect()
    }
}

/// `seed_kind = First`: the lowest-numbered `seed_size` live ids.
pub struct FirstSeeds;

impl SeedProvider for FirstSeeds {
    fn seeds(&self, graph: &NeighbourhoodGraph, seed_size: usize, _rng: &mut impl Rng) -> Vec<ObjectId> {
        let mut ids = graph.live_node_ids();
        ids.truncate(seed_size);
        ids
    }
}

/// `seed_kind = AllLeaf`: every node whose adjacency list is empty (a
/// "leaf" with no outgoing edges), capped at `seed_size`.
pub struct AllLeafSeeds;

impl SeedProvider for AllLeafSeeds {
    fn seeds(&self, graph: &NeighbourhoodGraph, seed_size: usize, _rng: &mut impl Rng) -> Vec<ObjectId> {
        graph
            .live_node_ids()
            .into_iter()
            .filter(|&id| graph.neighbours(id).is_empty())
            .take(seed_size)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, GraphKind};

    #[test]
    fn fixed_seeds_returns_exactly_what_was_given() {
        let g = NeighbourhoodGraph::new(GraphKind::Anng);
        let provider = FixedSeeds(vec![5, 6, 7]);
        let mut rng = rand::thread_rng();
        assert_eq!(provider.seeds(&g, 10, &mut rng), vec![5, 6, 7]);
    }

    #[test]
    fn all_leaf_seeds_excludes_nodes_with_edges() {
        let g = NeighbourhoodGraph::new(GraphKind::Anng);
        g.add_edge(1, Edge::new(2, 1.0));
        g.ensure_node(3);
        let mut rng = rand::thread_rng();
        let seeds = AllLeafSeeds.seeds(&g, 10, &mut rng);
        assert!(seeds.contains(&3));
        assert!(!seeds.contains(&1));
    }

    #[test]
    fn random_seeds_respects_cap() {
        let g = NeighbourhoodGraph::new(GraphKind::Anng);
        for id in 1..=20u32 {
            g.ensure_node(id);
        }
        let mut rng = rand::thread_rng();
        let seeds = RandomSeeds.seeds(&g, 5, &mut rng);
        assert_eq!(seeds.len(), 5);
    }
}
