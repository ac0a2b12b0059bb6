//! Read-only compact form of the graph.
//!
//! Produced by [`CompactGraph::from_mutable`] after `open(read_only=true)`:
//! adjacency lists packed into one contiguous array with per-node
//! `(offset, length)`, so traversal walks a single allocation instead of
//! chasing a `Vec<Option<AdjacencyList>>` of separate `Vec`s. Cannot be
//! mutated; any caller that needs to insert must keep using the mutable
//! [`super::NeighbourhoodGraph`] form.

use crate::error::{Error, Result};
use crate::graph::{Edge, NeighbourhoodGraph};
use crate::object_id::ObjectId;

/// Offset and length of one node's edges inside [`CompactGraph::edges`].
#[derive(Debug, Clone, Copy)]
struct Span {
    offset: u32,
    length: u32,
}

/// Immutable, contiguous packing of a [`NeighbourhoodGraph`]'s adjacency.
pub struct CompactGraph {
    spans: Vec<Option<Span>>,
    edges: Vec<Edge>,
}

impl CompactGraph {
    /// Packs `graph`'s current state. Subsequent mutation of `graph` is not
    /// reflected; callers compact once after finishing all writes.
    #[must_use]
    pub fn from_mutable(graph: &NeighbourhoodGraph) -> Self {
        let node_count = graph
            .live_node_ids()
            .into_iter()
            .max()
            .map_or(0, |id| id as usize + 1);

        let mut spans = vec![None; node_count];
        let mut edges = Vec::new();
        for id in graph.live_node_ids() {
            let list = graph.neighbours(id);
            let offset = crate::util::checked_u32!(edges.len() as u64, "compact graph edge offset");
            edges.extend(list.iter().copied());
            spans[id as usize] = Some(Span {
                offset,
                length: crate::util::checked_u32!(list.len() as u64, "node adjacency length"),
            });
        }

        Self { spans, edges }
    }

    /// Borrows `id`'s edges as a contiguous slice.
    ///
    /// # Errors
    /// [`Error::ReadOnly`] is never returned here (reads are always
    /// allowed); [`Error::NotFound`] if `id` has no entry.
    pub fn neighbours(&self, id: ObjectId) -> Result<&[Edge]> {
        match self.spans.get(id as usize).and_then(|s| *s) {
            Some(span) => {
                let start = span.offset as usize;
                let end = start + span.length as usize;
                Ok(&self.edges[start..end])
            }
            None => Err(Error::NotFound(id)),
        }
    }

    /// Mutation is never supported on the compact form; `add_vector` on
    /// an index opened read-only always fails.
    pub fn add_vector(&self) -> Result<()> {
        Err(Error::ReadOnly)
    }
}
