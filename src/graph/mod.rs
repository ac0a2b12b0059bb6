//! NeighbourhoodGraph: adjacency list keyed by `ObjectId`.
//!
//! Built on the same per-node `RwLock<Vec<NodeId>>` storage and lock
//! ordering an HNSW layer would use, but flattened to a single layer: the
//! graph kinds here (ANNG/IANNG/KNNG/BKNNG/ONNG/DNNG) are flat k-NN
//! graphs, not hierarchical like HNSW.

pub mod compact;
pub mod insertion;
pub mod path_adjust;
pub mod truncation;

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::object_id::ObjectId;
use crate::sync::RwLock;

/// An outgoing edge: a neighbour id and the distance the builder computed
/// to it at insertion/maintenance time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// The neighbouring object.
    pub neighbour: ObjectId,
    /// Distance in the metric space the graph was built with.
    pub distance: f32,
}

impl Edge {
    /// Builds an edge, keeping the raw comparator output rather than any
    /// caller-side rescaling.
    #[must_use]
    pub const fn new(neighbour: ObjectId, distance: f32) -> Self {
        Self { neighbour, distance }
    }
}

fn edge_cmp(a: &Edge, b: &Edge) -> std::cmp::Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.neighbour.cmp(&b.neighbour))
}

/// An ordered sequence of [`Edge`]s: distance ascending, ties broken by
/// neighbour id ascending (G3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjacencyList(Vec<Edge>);

impl AdjacencyList {
    /// An empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a list from edges already in distance-ascending,
    /// neighbour-ascending order (G3). Callers must uphold the ordering;
    /// this does not re-sort.
    #[must_use]
    pub const fn from_sorted_edges(edges: Vec<Edge>) -> Self {
        Self(edges)
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates edges in their maintained order.
    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.0.iter()
    }

    /// Inserts `edge` keeping the list sorted, deduplicating by neighbour
    /// id (the later insert wins the distance value, which is the only
    /// behaviour that makes sense since distance is a deterministic
    /// function of (owner, neighbour) under a fixed metric).
    pub fn insert_sorted(&mut self, edge: Edge) {
        if let Some(existing) = self.0.iter_mut().find(|e| e.neighbour == edge.neighbour) {
            *existing = edge;
        } else {
            self.0.push(edge);
        }
        self.0.sort_by(edge_cmp);
    }

    /// Removes the edge to `neighbour`, if present.
    pub fn remove(&mut self, neighbour: ObjectId) {
        self.0.retain(|e| e.neighbour != neighbour);
    }

    /// True if there's an edge to `neighbour`.
    #[must_use]
    pub fn contains(&self, neighbour: ObjectId) -> bool {
        self.0.iter().any(|e| e.neighbour == neighbour)
    }

    /// Truncates to the first `cap` edges (already distance-sorted).
    pub fn truncate(&mut self, cap: usize) {
        self.0.truncate(cap);
    }

    /// Worst (largest-distance) edge, if any.
    #[must_use]
    pub fn worst(&self) -> Option<&Edge> {
        self.0.last()
    }
}

/// The insertion-policy family a graph was built with. Read path (best-first
/// search) is common to all kinds; only construction differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphKind {
    /// Bidirectional k-NN-style graph, default; subject to edge truncation.
    Anng,
    /// "Improved" ANNG: in-place eviction instead of deferred truncation.
    Ianng,
    /// Outgoing edges only.
    Knng,
    /// Bidirectional KNNG: merges the reverse edge into every candidate's list.
    Bknng,
    /// Optimised NN graph with exact outgoing/incoming caps, never truncates.
    Onng,
    /// Degree-bounded NN graph (construction-time cap enforced like ONNG,
    /// read path identical to the others).
    Dnng,
}

impl Default for GraphKind {
    fn default() -> Self {
        Self::Anng
    }
}

/// Mapping `ObjectId → AdjacencyList`, mutable form.
///
/// G1: every live `ObjectId` has an entry (possibly empty) once
/// [`Self::ensure_node`] has been called for it, which every insertion
/// policy does before adding edges.
pub struct NeighbourhoodGraph {
    kind: GraphKind,
    adjacency: RwLock<Vec<Option<AdjacencyList>>>,
}

impl NeighbourhoodGraph {
    /// Creates an empty graph of the given kind.
    #[must_use]
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            adjacency: RwLock::new(Vec::new()),
        }
    }

    /// The insertion-policy family this graph was built with.
    #[must_use]
    pub const fn kind(&self) -> GraphKind {
        self.kind
    }

    /// Ensures `id` has an (initially empty) adjacency entry (G1).
    pub fn ensure_node(&self, id: ObjectId) {
        let mut adj = self.adjacency.write();
        let idx = id as usize;
        if idx >= adj.len() {
            adj.resize_with(idx + 1, || None);
        }
        if adj[idx].is_none() {
            adj[idx] = Some(AdjacencyList::new());
        }
    }

    /// Drops `id`'s adjacency entry and removes every edge pointing at it
    /// from other nodes' lists.
    pub fn remove_node(&self, id: ObjectId) {
        let mut adj = self.adjacency.write();
        if let Some(slot) = adj.get_mut(id as usize) {
            *slot = None;
        }
        for entry in adj.iter_mut().flatten() {
            entry.remove(id);
        }
    }

    /// Snapshot copy of `id`'s adjacency list (empty if the node has no
    /// entry).
    #[must_use]
    pub fn neighbours(&self, id: ObjectId) -> AdjacencyList {
        self.adjacency
            .read()
            .get(id as usize)
            .and_then(|slot| slot.clone())
            .unwrap_or_default()
    }

    /// Inserts a single directed edge `from -> to`, keeping `from`'s list
    /// sorted (G2: callers must never call this with `from == to`).
    ///
    /// # Panics
    /// Panics in debug builds on a self-edge, enforcing G2 at the source.
    pub fn add_edge(&self, from: ObjectId, edge: Edge) {
        debug_assert_ne!(from, edge.neighbour, "self-edges are forbidden by G2");
        self.ensure_node(from);
        let mut adj = self.adjacency.write();
        adj[from as usize]
            .get_or_insert_with(AdjacencyList::new)
            .insert_sorted(edge);
    }

    /// Removes edge `from -> to`, if present.
    pub fn remove_edge(&self, from: ObjectId, to: ObjectId) {
        let mut adj = self.adjacency.write();
        if let Some(Some(list)) = adj.get_mut(from as usize) {
            list.remove(to);
        }
    }

    /// Replaces `id`'s whole adjacency list (used by truncation/path
    /// adjustment, which recompute a node's list wholesale).
    pub fn set_neighbours(&self, id: ObjectId, list: AdjacencyList) {
        self.ensure_node(id);
        let mut adj = self.adjacency.write();
        adj[id as usize] = Some(list);
    }

    /// Number of nodes with an entry (G1), including empty ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.read().iter().filter(|s| s.is_some()).count()
    }

    /// Every node id with a non-`None` entry, in ascending order.
    #[must_use]
    pub fn live_node_ids(&self) -> Vec<ObjectId> {
        self.adjacency
            .read()
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx as ObjectId))
            .collect()
    }

    /// Serialises as: `u32` count N; for each of the N slots, `-` for empty
    /// or `+` followed by `u32 len, (u32 id, f32 dist) × len`.
    ///
    /// # Errors
    /// [`Error::Io`] on a write failure.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        let adj = self.adjacency.read();
        writer.write_all(&(adj.len() as u32).to_le_bytes())?;
        for slot in adj.iter() {
            match slot {
                None => writer.write_all(b"-")?,
                Some(list) => {
                    writer.write_all(b"+")?;
                    writer.write_all(&(list.len() as u32).to_le_bytes())?;
                    for edge in list.iter() {
                        writer.write_all(&edge.neighbour.to_le_bytes())?;
                        writer.write_all(&edge.distance.to_le_bytes())?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Reopens a graph previously written by [`Self::save`].
    ///
    /// # Errors
    /// [`Error::Corrupt`] on a malformed tag byte; [`Error::Io`] on a read
    /// failure.
    pub fn open<R: Read>(kind: GraphKind, mut reader: R) -> Result<Self> {
        let mut count_buf = [0u8; 4];
        reader.read_exact(&mut count_buf)?;
        let count = u32::from_le_bytes(count_buf) as usize;

        let mut adj = Vec::with_capacity(count);
        let mut tag = [0u8; 1];
        for _ in 0..count {
            reader.read_exact(&mut tag)?;
            match &tag {
                b"-" => adj.push(None),
                b"+" => {
                    let mut len_buf = [0u8; 4];
                    reader.read_exact(&mut len_buf)?;
                    let len = u32::from_le_bytes(len_buf) as usize;
                    let mut list = Vec::with_capacity(len);
                    for _ in 0..len {
                        let mut id_buf = [0u8; 4];
                        let mut dist_buf = [0u8; 4];
                        reader.read_exact(&mut id_buf)?;
                        reader.read_exact(&mut dist_buf)?;
                        list.push(Edge::new(
                            u32::from_le_bytes(id_buf),
                            f32::from_le_bytes(dist_buf),
                        ));
                    }
                    adj.push(Some(AdjacencyList(list)));
                }
                other => {
                    return Err(Error::Corrupt(format!(
                        "unexpected graph tag byte {other:?}"
                    )))
                }
            }
        }

        Ok(Self {
            kind,
            adjacency: RwLock::new(adj),
        })
    }
}
