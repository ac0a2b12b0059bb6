//! QuantisedInvertedIndex: product-quantisation codebook, coarse
//! blob partitioning, and ADT search with refinement.

pub mod adt;
pub mod build;
pub mod kmeans;

use std::collections::HashMap;

use crate::error::Result;
use crate::object_id::ObjectId;
use crate::quantized::adt::{refine, scan_postings, AsymmetricDistanceTable, PostingEntry};
use crate::quantized::build::{hierarchical_blob_centroids, BlobId, Codebook, Rotation};

/// Configuration for building a [`QuantisedInvertedIndex`].
#[derive(Debug, Clone, Copy)]
pub struct QuantisationParams {
    /// Number of coarse partitions (`BlobId`s).
    pub num_blobs: usize,
    /// Number of equal-length subspaces each residual is split into.
    pub num_subspaces: usize,
    /// Centroids per subspace codebook; one of `{16, 256, 65536}`.
    pub codebook_size: usize,
    /// Whether to train and apply a decorrelating rotation before quantising.
    pub use_rotation: bool,
}

impl Default for QuantisationParams {
    fn default() -> Self {
        Self {
            num_blobs: 16,
            num_subspaces: 4,
            codebook_size: 256,
            use_rotation: false,
        }
    }
}

/// Product-quantised inverted index: blob routing plus per-blob posting
/// lists of compressed sub-vectors, queried via an asymmetric distance
/// table with optional exact-metric refinement.
pub struct QuantisedInvertedIndex {
    dim: usize,
    params: QuantisationParams,
    rotation: Rotation,
    blob_centroids: Vec<Vec<f32>>,
    codebook: Codebook,
    postings: HashMap<BlobId, Vec<PostingEntry>>,
}

impl QuantisedInvertedIndex {
    /// Builds the index offline from every `(id, vector)` pair currently
    /// live in the object store.
    ///
    /// `vector`s must already be the object store's stored (padded)
    /// representation truncated/extended to `dim`.
    #[must_use]
    pub fn build(objects: &[(ObjectId, Vec<f32>)], dim: usize, params: QuantisationParams) -> Self {
        let rotation = if params.use_rotation {
            Rotation::random_orthogonal(dim, 0xC0FF_EE00_u64)
        } else {
            Rotation::identity(dim)
        };

        let rotated: Vec<Vec<f32>> = objects.iter().map(|(_, v)| rotation.apply(v)).collect();
        let blob_centroids = hierarchical_blob_centroids(&rotated, params.num_blobs, dim);

        let assignments: Vec<usize> = rotated
            .iter()
            .map(|v| kmeans::nearest_centroid(v, &blob_centroids))
            .collect();

        let residuals: Vec<Vec<f32>> = rotated
            .iter()
            .zip(&assignments)
            .map(|(v, &blob)| {
                v.iter()
                    .zip(&blob_centroids[blob])
                    .map(|(x, c)| x - c)
                    .collect()
            })
            .collect();

        let codebook = Codebook::train(&residuals, params.num_subspaces, params.codebook_size, dim);

        let mut postings: HashMap<BlobId, Vec<PostingEntry>> = HashMap::new();
        for (i, (id, _)) in objects.iter().enumerate() {
            let codes = codebook.encode(&residuals[i]);
            postings
                .entry(assignments[i] as BlobId)
                .or_default()
                .push(PostingEntry { id: *id, codes });
        }

        Self {
            dim,
            params,
            rotation,
            blob_centroids,
            codebook,
            postings,
        }
    }

    /// Every `BlobId` currently populated, for invariant checks (Q1: every
    /// object built belongs to exactly one blob's posting list).
    #[must_use]
    pub fn blob_ids(&self) -> Vec<BlobId> {
        self.postings.keys().copied().collect()
    }

    /// Total number of objects across every posting list.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }

    /// Approximate-then-refine search.
    ///
    /// `n_probes` blob centroids nearest the rotated query are scanned;
    /// `result_expansion` controls how many approximate candidates get
    /// exactly re-scored before the final top-k is picked.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        n_probes: usize,
        result_expansion: f32,
        mut exact_distance: impl FnMut(ObjectId) -> Result<f32>,
    ) -> Result<Vec<(ObjectId, f32)>> {
        debug_assert_eq!(query.len(), self.dim);
        let rotated_query = self.rotation.apply(query);

        let mut blob_order: Vec<(BlobId, f32)> = self
            .blob_centroids
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let d: f32 = rotated_query.iter().zip(c).map(|(a, b)| (a - b) * (a - b)).sum();
                (idx as BlobId, d)
            })
            .collect();
        blob_order.sort_by(|a, b| a.1.total_cmp(&b.1));
        blob_order.truncate(n_probes.max(1));

        let mut approximate: Vec<(ObjectId, f32)> = Vec::new();
        for (blob, _) in &blob_order {
            let Some(postings) = self.postings.get(blob) else {
                continue;
            };
            let residual: Vec<f32> = rotated_query
                .iter()
                .zip(&self.blob_centroids[*blob as usize])
                .map(|(x, c)| x - c)
                .collect();
            let adt = AsymmetricDistanceTable::build(&self.codebook, &residual);
            approximate.extend(scan_postings(postings, &adt, k.max(1) * 4));
        }
        approximate.sort_by(|a, b| a.1.total_cmp(&b.1));

        refine(&approximate, k, result_expansion, &mut exact_distance)
    }

    /// Number of subspaces the codebook was trained with.
    #[must_use]
    pub const fn num_subspaces(&self) -> usize {
        self.params.num_subspaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{distance, Metric};

    fn synthetic_dataset(n: usize, dim: usize) -> Vec<(ObjectId, Vec<f32>)> {
        (0..n)
            .map(|i| {
                let base = (i % 13) as f32;
                let v: Vec<f32> = (0..dim).map(|d| base + (d as f32) * 0.01).collect();
                ((i + 1) as ObjectId, v)
            })
            .collect()
    }

    #[test]
    fn every_object_belongs_to_exactly_one_blob() {
        let objects = synthetic_dataset(200, 16);
        let params = QuantisationParams {
            num_blobs: 4,
            num_subspaces: 4,
            codebook_size: 16,
            use_rotation: false,
        };
        let index = QuantisedInvertedIndex::build(&objects, 16, params);
        assert_eq!(index.object_count(), objects.len());
    }

    #[test]
    fn use_rotation_still_recovers_the_query_itself() {
        let objects = synthetic_dataset(200, 16);
        let params = QuantisationParams {
            num_blobs: 4,
            num_subspaces: 4,
            codebook_size: 16,
            use_rotation: true,
        };
        let index = QuantisedInvertedIndex::build(&objects, 16, params);
        let query = objects[3].1.clone();
        let lookup: HashMap<ObjectId, Vec<f32>> = objects.iter().cloned().collect();
        let results = index
            .search(&query, 5, 4, 10.0, |id| distance(Metric::L2, &query, &lookup[&id]))
            .unwrap();
        assert!(!results.is_empty());
    }

    #[test]
    fn search_recovers_the_query_itself_when_present() {
        let objects = synthetic_dataset(500, 32);
        let params = QuantisationParams {
            num_blobs: 8,
            num_subspaces: 4,
            codebook_size: 16,
            use_rotation: false,
        };
        let index = QuantisedInvertedIndex::build(&objects, 32, params);
        let query = objects[10].1.clone();
        let lookup: HashMap<ObjectId, Vec<f32>> = objects.iter().cloned().collect();
        let results = index
            .search(&query, 5, 4, 10.0, |id| {
                distance(Metric::L2, &query, &lookup[&id])
            })
            .unwrap();
        assert!(!results.is_empty());
        assert!(results[0].1 <= results.last().unwrap().1);
    }
}
