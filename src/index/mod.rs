//! IndexFacade: binds the metric kernels, object store, neighbourhood
//! graph, and searcher into a concrete index kind, exposing the public
//! insert/remove/search/save/open lifecycle.

pub mod properties;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::thread_rng;

use crate::concurrency::ConcurrencyEnvelope;
use crate::error::{Error, Result};
use crate::graph::insertion::{self, InsertionPolicy};
use crate::graph::path_adjust::reduce_shortcuts;
use crate::graph::{GraphKind, NeighbourhoodGraph};
use crate::index::properties::{keys, PropertyFile};
use crate::metric::Metric;
use crate::object_id::ObjectId;
use crate::quantized::{QuantisationParams, QuantisedInvertedIndex};
use crate::scalar::ScalarKind;
use crate::search::seed::{AllLeafSeeds, FirstSeeds, FixedSeeds, NoSeeds, RandomSeeds, SeedProvider};
use crate::search::{self, CancellationToken, NeverCancel, SearchOutcome, SearchParams};
use crate::store::ObjectStore;

/// Which of the three concrete bindings an index uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Plain proximity graph.
    Graph,
    /// Graph plus an auxiliary seed tree (seeding detailed in
    /// [`crate::search::seed`]; this crate's tree seed is a thin
    /// first-N-nodes provider rather than a full kd/ball tree, see
    /// DESIGN.md for why).
    GraphWithTreeSeed,
    /// Graph used for blob routing, layered under a
    /// [`QuantisedInvertedIndex`].
    Quantised,
}

/// Which initial nodes a search starts from (`seed_kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedKind {
    /// Caller must supply explicit seeds.
    None,
    /// `seed_size` random live nodes.
    Random,
    /// A fixed, caller-supplied set of ids, taken from
    /// [`IndexOptions::fixed_seeds`].
    Fixed,
    /// The lowest-numbered live ids.
    First,
    /// Every node with an empty adjacency list.
    AllLeaf,
}

/// `edge_size_for_search` resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeSizeForSearch {
    /// Use `edge_size_for_creation`.
    SameAsCreation,
    /// A fixed traversal width, independent of `epsilon`.
    Fixed(usize),
    /// `base + 10^((epsilon - 1) * rate)`, using
    /// `dynamic_edge_size_base`/`dynamic_edge_size_rate`. Persisted as the
    /// `-2` sentinel in the `prf` file.
    Dynamic,
}

/// Recognised `IndexFacade` configuration options.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Cap used during insert candidate collection.
    pub edge_size_for_creation: usize,
    /// Override edge traversal width during search; default is
    /// `SameAsCreation`.
    pub edge_size_for_search: EdgeSizeForSearch,
    /// `base` term of the dynamic edge-size formula, used only when
    /// `edge_size_for_search == EdgeSizeForSearch::Dynamic`.
    pub dynamic_edge_size_base: usize,
    /// `rate` term of the dynamic edge-size formula, used only when
    /// `edge_size_for_search == EdgeSizeForSearch::Dynamic`.
    pub dynamic_edge_size_rate: f32,
    /// Hard cap triggering truncation.
    pub edge_size_limit_for_creation: usize,
    /// Soft cap beyond which truncation is queued.
    pub truncation_threshold: usize,
    /// Exploration coefficient for insert.
    pub insertion_epsilon: f32,
    /// If set, aborts the bulk-build loop when exceeded.
    pub build_time_limit: Option<Duration>,
    /// Initial-seed strategy.
    pub seed_kind: SeedKind,
    /// The fixed seed set used when `seed_kind == SeedKind::Fixed`. Ignored
    /// for every other `SeedKind`.
    pub fixed_seeds: Vec<ObjectId>,
    /// Insert batch size for bulk build.
    pub batch_size: usize,
    /// ONNG outgoing cap.
    pub outgoing_edge: usize,
    /// ONNG incoming cap.
    pub incoming_edge: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            edge_size_for_creation: 10,
            edge_size_for_search: EdgeSizeForSearch::SameAsCreation,
            dynamic_edge_size_base: 10,
            dynamic_edge_size_rate: 30.0,
            edge_size_limit_for_creation: 5,
            truncation_threshold: 50,
            insertion_epsilon: 0.1,
            build_time_limit: None,
            seed_kind: SeedKind::Random,
            fixed_seeds: Vec::new(),
            batch_size: 200,
            outgoing_edge: 10,
            incoming_edge: 10,
        }
    }
}

impl IndexOptions {
    fn insertion_policy(&self) -> InsertionPolicy {
        InsertionPolicy {
            edge_size_for_creation: self.edge_size_for_creation,
            edge_size_limit_for_creation: self.edge_size_limit_for_creation,
            truncation_threshold: self.truncation_threshold,
            outgoing_edge: self.outgoing_edge,
            incoming_edge: self.incoming_edge,
        }
    }

    /// Resolves `edge_size_for_search` to a concrete traversal width for a
    /// search run at the given `epsilon`.
    fn resolved_edge_size_for_search(&self, epsilon: f32) -> usize {
        match self.edge_size_for_search {
            EdgeSizeForSearch::SameAsCreation => self.edge_size_for_creation,
            EdgeSizeForSearch::Fixed(n) => n,
            EdgeSizeForSearch::Dynamic => {
                let dynamic = self.dynamic_edge_size_base as f32
                    + 10f32.powf((epsilon - 1.0) * self.dynamic_edge_size_rate);
                dynamic.round().max(0.0) as usize
            }
        }
    }
}

/// A concrete nearest-neighbour index binding the metric kernels, object
/// store, graph, and searcher (and, for [`IndexKind::Quantised`], the
/// quantised inverted index) behind one lifecycle.
pub struct IndexFacade {
    kind: IndexKind,
    graph_kind: GraphKind,
    metric: Metric,
    scalar_kind: ScalarKind,
    dim: usize,
    options: IndexOptions,
    store: ObjectStore,
    graph: NeighbourhoodGraph,
    quantised: Option<QuantisedInvertedIndex>,
    envelope: ConcurrencyEnvelope,
    read_only: bool,
}

impl IndexFacade {
    /// Creates a brand-new, empty index of `kind`/`graph_kind`/`metric`.
    ///
    /// `initial_objects`, if non-empty, are bulk-inserted in batches of
    /// `options.batch_size`, aborting early (returning the partial index)
    /// if `options.build_time_limit` is exceeded.
    ///
    /// # Errors
    /// Whatever [`Self::insert`] returns for the first rejected vector.
    pub fn create(
        kind: IndexKind,
        graph_kind: GraphKind,
        metric: Metric,
        scalar_kind: ScalarKind,
        dim: usize,
        options: IndexOptions,
        initial_objects: &[Vec<f32>],
    ) -> Result<Self> {
        let mut index = Self {
            kind,
            graph_kind,
            metric,
            scalar_kind,
            dim,
            options,
            store: ObjectStore::allocate(scalar_kind, dim, metric),
            graph: NeighbourhoodGraph::new(graph_kind),
            quantised: None,
            envelope: ConcurrencyEnvelope::new(),
            read_only: false,
        };

        let deadline = index.options.build_time_limit.map(|d| Instant::now() + d);
        let mut inserted = 0usize;
        for batch in initial_objects.chunks(index.options.batch_size.max(1)) {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::info!(
                        inserted,
                        requested = initial_objects.len(),
                        "build_time_limit reached, returning partial index"
                    );
                    return Ok(index);
                }
            }
            for vector in batch {
                index.insert(vector)?;
                inserted += 1;
            }
            tracing::debug!(inserted, requested = initial_objects.len(), "bulk build progress");
        }

        if index.kind == IndexKind::Quantised && !initial_objects.is_empty() {
            index.rebuild_quantised(QuantisationParams::default());
        }

        tracing::info!(live = index.live_count(), ?kind, ?graph_kind, "index created");
        Ok(index)
    }

    /// Copies `vec` into the object store and integrates it into the
    /// graph per the configured [`GraphKind`]'s insertion policy.
    ///
    /// # Errors
    /// [`Error::ReadOnly`] if this index was opened read-only;
    /// otherwise whatever [`ObjectStore::insert`] returns.
    pub fn insert(&mut self, vec: &[f32]) -> Result<ObjectId> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        self.envelope.with_write(|| self.insert_locked(vec))
    }

    fn insert_locked(&self, vec: &[f32]) -> Result<ObjectId> {
        let id = self.store.insert(vec)?;
        self.graph.ensure_node(id);

        if self.graph.node_count() > 1 {
            let stored = self.store.get(id)?;
            let seeds = self.seed_set(&stored.as_slice().to_vec());
            let params = SearchParams {
                k: self.options.edge_size_for_creation,
                epsilon: self.options.insertion_epsilon,
                edge_size: Some(self.options.edge_size_for_creation),
                ..Default::default()
            };
            let outcome = search::search(
                &self.graph,
                &self.store,
                self.metric,
                stored.as_slice(),
                &seeds,
                &params,
                &NeverCancel,
            )?;
            let candidates: Vec<crate::graph::Edge> = outcome
                .hits
                .into_iter()
                .filter(|h| h.id != id)
                .map(|h| crate::graph::Edge::new(h.id, h.distance))
                .collect();
            insertion::integrate(&self.graph, id, &candidates, &self.options.insertion_policy());
        }

        Ok(id)
    }

    /// Removes `id` from both the object store and the graph (O2, G1).
    ///
    /// # Errors
    /// [`Error::ReadOnly`] if opened read-only; [`Error::NotFound`] if
    /// `id` is not currently live.
    pub fn remove(&mut self, id: ObjectId) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        self.envelope.with_write(|| {
            self.store.remove(id)?;
            self.graph.remove_node(id);
            Ok(())
        })
    }

    /// Runs a best-first search for `query`.
    ///
    /// May run concurrently with any number of other `search` calls, but
    /// never alongside a writer.
    ///
    /// # Errors
    /// Propagates metric-domain or internal errors from the searcher.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        radius: f32,
        epsilon: f32,
        cancel: &dyn CancellationToken,
    ) -> Result<SearchOutcome> {
        self.envelope.with_read(|| {
            let seeds = self.seed_set(&query.to_vec());
            let params = SearchParams {
                k,
                radius,
                epsilon,
                edge_size: Some(self.options.resolved_edge_size_for_search(epsilon)),
            };
            search::search(&self.graph, &self.store, self.metric, query, &seeds, &params, cancel)
        })
    }

    /// Quantised-variant search: routes through the blob index and refines
    /// against the exact metric. Only valid for
    /// [`IndexKind::Quantised`] indexes that have been built.
    ///
    /// # Errors
    /// [`Error::Internal`] if no quantised index has been built yet.
    pub fn search_quantised(
        &self,
        query: &[f32],
        k: usize,
        n_probes: usize,
        result_expansion: f32,
    ) -> Result<Vec<(ObjectId, f32)>> {
        let store = &self.store;
        let metric = self.metric;
        self.envelope.with_read(|| {
            let qi = self
                .quantised
                .as_ref()
                .ok_or_else(|| Error::Internal("quantised index has not been built".into()))?;
            qi.search(query, k, n_probes, result_expansion, |id| {
                let view = store.get(id)?;
                crate::metric::distance(metric, query, view.as_slice())
            })
        })
    }

    /// (Re)builds the [`QuantisedInvertedIndex`] layer from every
    /// currently-live object.
    pub fn rebuild_quantised(&mut self, params: QuantisationParams) {
        self.envelope.with_write(|| {
            let objects = self.store.iter_live();
            tracing::info!(objects = objects.len(), "rebuilding quantised index");
            self.quantised = Some(QuantisedInvertedIndex::build(&objects, self.dim, params));
        });
    }

    /// Runs edge truncation (ANNG only) and shortcut reduction over the
    /// whole graph; intended to run at save time or via an explicit call,
    /// not on the hot insert path.
    pub fn rebuild_graph_maintenance(&mut self) {
        self.envelope.with_write(|| {
            tracing::info!("running graph maintenance");
            if self.graph_kind == GraphKind::Anng {
                let cap = self
                    .options
                    .truncation_threshold
                    .max(self.options.edge_size_for_creation);
                for id in self.graph.live_node_ids() {
                    crate::graph::truncation::truncate_node(&self.graph, id, cap);
                }
            }
            reduce_shortcuts(&self.graph);
        });
    }

    fn seed_set(&self, _query: &[f32]) -> Vec<ObjectId> {
        let seed_size = crate::search::seed::DEFAULT_RANDOM_SEED_SIZE;
        let mut rng = thread_rng();
        match self.options.seed_kind {
            SeedKind::None => NoSeeds.seeds(&self.graph, seed_size, &mut rng),
            SeedKind::Random => RandomSeeds.seeds(&self.graph, seed_size, &mut rng),
            SeedKind::Fixed => FixedSeeds(self.options.fixed_seeds.clone()).seeds(&self.graph, seed_size, &mut rng),
            SeedKind::First => FirstSeeds.seeds(&self.graph, seed_size, &mut rng),
            SeedKind::AllLeaf => AllLeafSeeds.seeds(&self.graph, seed_size, &mut rng),
        }
    }

    /// Persists the index to `path` as a directory of `prf`, `obj`, `grp` files.
    ///
    /// # Errors
    /// [`Error::Io`] on any filesystem failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), live = self.live_count(), "saving index");
        self.envelope.with_write(|| self.save_locked(path))
    }

    fn save_locked(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;

        let mut props = PropertyFile::new();
        props.set(keys::DIMENSION, self.dim);
        props.set(keys::OBJECT_TYPE, format!("{:?}", self.scalar_kind));
        props.set(keys::METRIC_TYPE, format!("{:?}", self.metric));
        props.set(keys::GRAPH_TYPE, format!("{:?}", self.graph_kind));
        props.set(keys::EDGE_SIZE_FOR_CREATION, self.options.edge_size_for_creation);
        let edge_size_for_search: i64 = match self.options.edge_size_for_search {
            EdgeSizeForSearch::SameAsCreation => self.options.edge_size_for_creation as i64,
            EdgeSizeForSearch::Fixed(n) => n as i64,
            EdgeSizeForSearch::Dynamic => -2,
        };
        props.set(keys::EDGE_SIZE_FOR_SEARCH, edge_size_for_search);
        props.set(keys::DYNAMIC_EDGE_SIZE_BASE, self.options.dynamic_edge_size_base);
        props.set(keys::DYNAMIC_EDGE_SIZE_RATE, self.options.dynamic_edge_size_rate);
        props.set(keys::EDGE_SIZE_LIMIT_FOR_CREATION, self.options.edge_size_limit_for_creation);
        props.set(keys::TRUNCATION_THRESHOLD, self.options.truncation_threshold);
        props.set(keys::EPSILON_FOR_CREATION, self.options.insertion_epsilon);
        props.set(keys::BATCH_SIZE_FOR_CREATION, self.options.batch_size);
        props.set(keys::OUTGOING_EDGE, self.options.outgoing_edge);
        props.set(keys::INCOMING_EDGE, self.options.incoming_edge);
        let prf = File::create(prf_path(path))?;
        props.save(BufWriter::new(prf))?;

        let obj = File::create(obj_path(path))?;
        self.store.save(BufWriter::new(obj))?;

        let grp = File::create(grp_path(path))?;
        self.graph.save(BufWriter::new(grp))?;

        Ok(())
    }

    /// Reopens an index previously written by [`Self::save`].
    ///
    /// `read_only = true` produces an index whose mutating operations
    /// (`insert`/`remove`/`rebuild_*`) fail with [`Error::ReadOnly`].
    ///
    /// # Errors
    /// [`Error::Corrupt`] on a malformed persisted file;
    /// [`Error::Io`] on a filesystem failure.
    pub fn open(path: impl AsRef<Path>, kind: IndexKind, options: IndexOptions, read_only: bool) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), read_only, "opening index");
        let prf = BufReader::new(File::open(prf_path(path))?);
        let props = PropertyFile::open(prf)?;

        let dim = props
            .get_usize(keys::DIMENSION)?
            .ok_or_else(|| Error::Corrupt("prf missing Dimension".into()))?;
        let scalar_kind = match props.get(keys::OBJECT_TYPE) {
            Some("U8") => ScalarKind::U8,
            Some("F16") => ScalarKind::F16,
            Some("F32") | None => ScalarKind::F32,
            Some(other) => return Err(Error::Corrupt(format!("unknown ObjectType {other}"))),
        };
        let metric = parse_metric(props.get(keys::METRIC_TYPE))?;
        let graph_kind = parse_graph_kind(props.get(keys::GRAPH_TYPE))?;

        let obj = File::open(obj_path(path))?;
        let store = ObjectStore::open(scalar_kind, dim, metric, BufReader::new(obj))?;

        let grp = File::open(grp_path(path))?;
        let graph = NeighbourhoodGraph::open(graph_kind, BufReader::new(grp))?;

        Ok(Self {
            kind,
            graph_kind,
            metric,
            scalar_kind,
            dim,
            options,
            store,
            graph,
            quantised: None,
            envelope: ConcurrencyEnvelope::new(),
            read_only,
        })
    }

    /// Logical vector dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// The metric this index was built with.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of currently-live objects.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }
}

fn prf_path(base: &Path) -> PathBuf {
    base.join("prf")
}

fn obj_path(base: &Path) -> PathBuf {
    base.join("obj")
}

fn grp_path(base: &Path) -> PathBuf {
    base.join("grp")
}

fn parse_metric(value: Option<&str>) -> Result<Metric> {
    Ok(match value {
        Some("L1") => Metric::L1,
        Some("L2") | None => Metric::L2,
        Some("Hamming") => Metric::Hamming,
        Some("Jaccard") => Metric::Jaccard,
        Some("SparseJaccard") => Metric::SparseJaccard,
        Some("Angle") => Metric::Angle,
        Some("Cosine") => Metric::Cosine,
        Some("NormalizedAngle") => Metric::NormalizedAngle,
        Some("NormalizedCosine") => Metric::NormalizedCosine,
        Some("NormalizedL2") => Metric::NormalizedL2,
        Some("Poincare") => Metric::Poincare,
        Some("Lorentz") => Metric::Lorentz,
        Some(other) => return Err(Error::Corrupt(format!("unknown MetricType {other}"))),
    })
}

fn parse_graph_kind(value: Option<&str>) -> Result<GraphKind> {
    Ok(match value {
        Some("Anng") | None => GraphKind::Anng,
        Some("Ianng") => GraphKind::Ianng,
        Some("Knng") => GraphKind::Knng,
        Some("Bknng") => GraphKind::Bknng,
        Some("Onng") => GraphKind::Onng,
        Some("Dnng") => GraphKind::Dnng,
        Some(other) => return Err(Error::Corrupt(format!("unknown GraphType {other}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn default_index(points: &[Vec<f32>]) -> IndexFacade {
        IndexFacade::create(
            IndexKind::Graph,
            GraphKind::Anng,
            Metric::L2,
            ScalarKind::F32,
            2,
            IndexOptions::default(),
            points,
        )
        .unwrap()
    }

    #[test]
    fn scenario_s1_two_dim_l2() {
        let index = default_index(&[vec![0.0, 0.0], vec![3.0, 4.0], vec![1.0, 1.0]]);
        let outcome = index.search(&[0.0, 0.0], 2, f32::INFINITY, 1.0, &NeverCancel).unwrap();
        assert_eq!(outcome.hits[0].id, 1);
        assert!(outcome.hits[0].distance.abs() < 1e-6);
        assert_eq!(outcome.hits[1].id, 3);
        assert!((outcome.hits[1].distance - std::f32::consts::SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn insert_then_search_k1_finds_itself_at_zero_distance() {
        let mut index = default_index(&[]);
        let id = index.insert(&[5.0, -2.0]).unwrap();
        let outcome = index.search(&[5.0, -2.0], 1, f32::INFINITY, 0.1, &NeverCancel).unwrap();
        assert_eq!(outcome.hits[0].id, id);
        assert!(outcome.hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn remove_then_search_never_returns_removed_id() {
        let mut index = default_index(&(0..50).map(|i| vec![i as f32, 0.0]).collect::<Vec<_>>());
        index.remove(10).unwrap();
        let outcome = index
            .search(&[25.0, 0.0], 20, f32::INFINITY, 1.0, &NeverCancel)
            .unwrap();
        assert!(!outcome.hits.iter().any(|h| h.id == 10));
    }

    #[test]
    fn read_only_index_rejects_insert() {
        let index = default_index(&[vec![0.0, 0.0]]);
        let dir = tempdir().unwrap();
        index.save(dir.path()).unwrap();
        let mut reopened = IndexFacade::open(dir.path(), IndexKind::Graph, IndexOptions::default(), true).unwrap();
        assert!(matches!(reopened.insert(&[1.0, 1.0]), Err(Error::ReadOnly)));
    }

    #[test]
    fn save_and_open_round_trips_search_results() {
        let index = default_index(&[vec![0.0, 0.0], vec![3.0, 4.0], vec![1.0, 1.0]]);
        let dir = tempdir().unwrap();
        index.save(dir.path()).unwrap();

        let reopened = IndexFacade::open(dir.path(), IndexKind::Graph, IndexOptions::default(), false).unwrap();
        let outcome = reopened.search(&[0.0, 0.0], 2, f32::INFINITY, 1.0, &NeverCancel).unwrap();
        assert_eq!(outcome.hits[0].id, 1);
    }

    #[test]
    fn seed_kind_fixed_uses_the_configured_seeds_not_first_seeds() {
        let options = IndexOptions {
            seed_kind: SeedKind::Fixed,
            fixed_seeds: vec![2, 4],
            ..Default::default()
        };
        let index = IndexFacade::create(
            IndexKind::Graph,
            GraphKind::Anng,
            Metric::L2,
            ScalarKind::F32,
            2,
            options,
            &(0..10).map(|i| vec![i as f32, 0.0]).collect::<Vec<_>>(),
        )
        .unwrap();
        assert_eq!(index.seed_set(&[0.0, 0.0]), vec![2, 4]);
    }

    #[test]
    fn seed_kind_none_yields_no_seeds() {
        let options = IndexOptions {
            seed_kind: SeedKind::None,
            ..Default::default()
        };
        let index = IndexFacade::create(
            IndexKind::Graph,
            GraphKind::Anng,
            Metric::L2,
            ScalarKind::F32,
            2,
            options,
            &(0..10).map(|i| vec![i as f32, 0.0]).collect::<Vec<_>>(),
        )
        .unwrap();
        assert!(index.seed_set(&[0.0, 0.0]).is_empty());
    }

    #[test]
    fn dynamic_edge_size_for_search_follows_the_base_plus_power_formula() {
        let options = IndexOptions {
            edge_size_for_search: EdgeSizeForSearch::Dynamic,
            dynamic_edge_size_base: 10,
            dynamic_edge_size_rate: 30.0,
            ..Default::default()
        };
        let epsilon = 0.1;
        let expected = (10.0 + 10f32.powf((epsilon - 1.0) * 30.0)).round() as usize;
        assert_eq!(options.resolved_edge_size_for_search(epsilon), expected);
    }

    #[test]
    fn fixed_edge_size_for_search_ignores_epsilon() {
        let options = IndexOptions {
            edge_size_for_search: EdgeSizeForSearch::Fixed(42),
            ..Default::default()
        };
        assert_eq!(options.resolved_edge_size_for_search(0.1), 42);
        assert_eq!(options.resolved_edge_size_for_search(5.0), 42);
    }

    #[test]
    fn save_persists_dynamic_edge_size_sentinel_and_params() {
        let options = IndexOptions {
            edge_size_for_search: EdgeSizeForSearch::Dynamic,
            dynamic_edge_size_base: 7,
            dynamic_edge_size_rate: 12.5,
            ..Default::default()
        };
        let index = IndexFacade::create(
            IndexKind::Graph,
            GraphKind::Anng,
            Metric::L2,
            ScalarKind::F32,
            2,
            options,
            &[vec![0.0, 0.0]],
        )
        .unwrap();
        let dir = tempdir().unwrap();
        index.save(dir.path()).unwrap();

        let prf = BufReader::new(File::open(prf_path(dir.path())).unwrap());
        let props = PropertyFile::open(prf).unwrap();
        assert_eq!(props.get_i64(keys::EDGE_SIZE_FOR_SEARCH).unwrap(), Some(-2));
        assert_eq!(props.get_usize(keys::DYNAMIC_EDGE_SIZE_BASE).unwrap(), Some(7));
        assert_eq!(props.get_f32(keys::DYNAMIC_EDGE_SIZE_RATE).unwrap(), Some(12.5));
    }

    #[test]
    fn truncation_threshold_is_respected_after_maintenance() {
        let points: Vec<Vec<f32>> = (0..200).map(|i| vec![i as f32, 0.0]).collect();
        let options = IndexOptions {
            edge_size_for_creation: 10,
            truncation_threshold: 20,
            ..Default::default()
        };
        let mut index = IndexFacade::create(
            IndexKind::Graph,
            GraphKind::Anng,
            Metric::L2,
            ScalarKind::F32,
            2,
            options,
            &points,
        )
        .unwrap();
        index.rebuild_graph_maintenance();
        for id in index.graph.live_node_ids() {
            assert!(index.graph.neighbours(id).len() <= 20);
        }
    }
}
