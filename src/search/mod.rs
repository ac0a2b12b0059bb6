//! Best-first graph traversal.
//!
//! Frontier and result heaps use an `OrderedFloat` wrapper around `f32`
//! ordered via `total_cmp`, so `BinaryHeap` never panics on `NaN`/unordered
//! comparisons. Visited-set uses `rustc_hash::FxHashSet`: visited-set
//! membership checks dominate large best-first searches and the default
//! `SipHash` is needless overhead here.

pub mod seed;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::graph::NeighbourhoodGraph;
use crate::metric::Metric;
use crate::object_id::ObjectId;
use crate::store::ObjectStore;

/// `f32` wrapper with a total order via `total_cmp`, so it can sit inside
/// a `BinaryHeap` key without the `Ord`-on-`f32` trap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedFloat(pub f32);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One result: the object found and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// The object id.
    pub id: ObjectId,
    /// Distance to the query under the index's metric.
    pub distance: f32,
}

/// Outcome of a search: results plus bookkeeping §4.4 requires be reported
/// alongside them.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Top-k (or radius-bounded) results, sorted by distance ascending,
    /// ties broken by [`ObjectId`] ascending.
    pub hits: Vec<Hit>,
    /// Number of `metric` evaluations performed.
    pub distance_computations: u64,
    /// Number of distinct nodes visited.
    pub visited_count: u64,
    /// True if the search terminated early via a cancellation token, in
    /// which case `hits` holds a partial result.
    pub aborted: bool,
}

/// Query-time parameters (§4.4).
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Number of results wanted.
    pub k: usize,
    /// Only results within this distance are returned.
    pub radius: f32,
    /// Exploration coefficient; the frontier bound is multiplied by
    /// `1 + epsilon`.
    pub epsilon: f32,
    /// Overrides the number of edges examined per node; `None` uses every
    /// edge in the adjacency list.
    pub edge_size: Option<usize>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            k: 10,
            radius: f32::INFINITY,
            epsilon: 0.1,
            edge_size: None,
        }
    }
}

/// Cooperative cancellation token, checked once per frontier pop (§5).
pub trait CancellationToken {
    /// Returns true if the search should stop and return its partial result.
    fn is_cancelled(&self) -> bool;
}

/// A token that never cancels, for callers with no abort mechanism.
pub struct NeverCancel;

impl CancellationToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

struct Frontier {
    heap: BinaryHeap<Reverse<(OrderedFloat, ObjectId)>>,
}

impl Frontier {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    fn push(&mut self, id: ObjectId, distance: f32) {
        self.heap.push(Reverse((OrderedFloat(distance), id)));
    }

    fn pop(&mut self) -> Option<(ObjectId, f32)> {
        self.heap.pop().map(|Reverse((d, id))| (id, d.0))
    }
}

struct ResultSet {
    heap: BinaryHeap<(OrderedFloat, Reverse<ObjectId>)>,
    cap: usize,
}

impl ResultSet {
    fn new(cap: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            cap,
        }
    }

    fn push(&mut self, id: ObjectId, distance: f32) {
        if self.cap == 0 {
            return;
        }
        self.heap.push((OrderedFloat(distance), Reverse(id)));
        if self.heap.len() > self.cap {
            self.heap.pop();
        }
    }

    fn is_full(&self) -> bool {
        self.heap.len() >= self.cap
    }

    fn worst_distance(&self) -> Option<f32> {
        self.heap.peek().map(|(d, _)| d.0)
    }

    fn into_sorted_hits(self) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .heap
            .into_iter()
            .map(|(d, Reverse(id))| Hit { id, distance: d.0 })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        hits
    }
}

/// Runs best-first search from `seeds` against `graph`/`store` for `query`
/// under `metric`, per §4.4's algorithm.
///
/// # Errors
/// Propagates [`Error::NotFound`] if a seed or neighbour id has no stored
/// vector (an internal-consistency bug, not a normal caller error), and
/// any [`Error::DistanceDomain`]/[`Error::InvalidVector`] the metric raises.
pub fn search(
    graph: &NeighbourhoodGraph,
    store: &ObjectStore,
    metric: Metric,
    query: &[f32],
    seeds: &[ObjectId],
    params: &SearchParams,
    cancel: &dyn CancellationToken,
) -> Result<SearchOutcome> {
    let mut visited: FxHashSet<ObjectId> = FxHashSet::default();
    let mut frontier = Frontier::new();
    let mut results = ResultSet::new(params.k);
    let mut distance_computations = 0u64;
    let mut aborted = false;

    for &seed in seeds {
        if !visited.insert(seed) {
            continue;
        }
        let view = store.get(seed)?;
        let d = crate::metric::distance(metric, query, view.as_slice())?;
        distance_computations += 1;
        if d <= params.radius {
            results.push(seed, d);
        }
        frontier.push(seed, d);
    }

    loop {
        if cancel.is_cancelled() {
            aborted = true;
            break;
        }
        let bound = current_bound(&results, params);
        let Some((node, d)) = frontier.pop() else {
            break;
        };
        if d > bound {
            break;
        }

        let neighbours = graph.neighbours(node);
        let edge_limit = params.edge_size.unwrap_or(usize::MAX);
        for edge in neighbours.iter().take(edge_limit) {
            if !visited.insert(edge.neighbour) {
                continue;
            }
            let view = store.get(edge.neighbour)?;
            let dprime = crate::metric::distance(metric, query, view.as_slice())?;
            distance_computations += 1;

            if dprime <= params.radius {
                results.push(edge.neighbour, dprime);
            }
            let bound_after = current_bound(&results, params);
            if dprime <= bound_after {
                frontier.push(edge.neighbour, dprime);
            }
        }
    }

    Ok(SearchOutcome {
        hits: results.into_sorted_hits(),
        distance_computations,
        visited_count: visited.len() as u64,
        aborted,
    })
}

fn current_bound(results: &ResultSet, params: &SearchParams) -> f32 {
    let from_results = if results.is_full() {
        results
            .worst_distance()
            .map_or(f32::INFINITY, |d| d * (1.0 + params.epsilon))
    } else {
        f32::INFINITY
    };
    from_results.min(params.radius)
}

/// Convenience wrapper returning [`Error::Aborted`] instead of a partial
/// result with `aborted = true`, for callers that want `?`-propagation
/// instead of inspecting the flag.
pub fn search_strict(
    graph: &NeighbourhoodGraph,
    store: &ObjectStore,
    metric: Metric,
    query: &[f32],
    seeds: &[ObjectId],
    params: &SearchParams,
    cancel: &dyn CancellationToken,
) -> Result<Vec<Hit>> {
    let outcome = search(graph, store, metric, query, seeds, params, cancel)?;
    if outcome.aborted {
        return Err(Error::Aborted("search cancelled before completion".into()));
    }
    Ok(outcome.hits)
}
