//! Asymmetric distance table (ADT) build, scan, and refinement.

use crate::object_id::ObjectId;
use crate::quantized::build::Codebook;

/// Per-subspace table of squared distances between a (rotated, residual)
/// query sub-vector and every centroid in that subspace's codebook.
///
/// An 8-bit table with a recorded scale+offset would halve the memory
/// footprint, but this crate keeps the table at full `f32` precision:
/// the dominant query cost is the posting-list scan, not the table's
/// footprint, and `f32` sidesteps having to bound quantisation error on
/// the table itself.
pub struct AsymmetricDistanceTable {
    tables: Vec<Vec<f32>>,
}

impl AsymmetricDistanceTable {
    /// Builds the table for one `residual` query (already rotated and
    /// blob-centroid-subtracted) against `codebook`.
    #[must_use]
    pub fn build(codebook: &Codebook, residual: &[f32]) -> Self {
        let mut tables = Vec::with_capacity(codebook.num_subspaces);
        for s in 0..codebook.num_subspaces {
            let sub = &residual[s * codebook.sub_dim..(s + 1) * codebook.sub_dim];
            let table: Vec<f32> = codebook.centroids[s]
                .iter()
                .map(|centroid| {
                    sub.iter()
                        .zip(centroid)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum()
                })
                .collect();
            tables.push(table);
        }
        Self { tables }
    }

    /// Sums up `ADT[subspace][codes[subspace]]` across every subspace for
    /// one posting-list entry.
    #[must_use]
    pub fn approximate_distance(&self, codes: &[u32]) -> f32 {
        self.tables
            .iter()
            .zip(codes)
            .map(|(table, &code)| table[code as usize])
            .sum()
    }
}

/// One posting-list entry: the object and its per-subspace codes.
#[derive(Debug, Clone)]
pub struct PostingEntry {
    /// The stored object.
    pub id: ObjectId,
    /// Per-subspace codes.
    pub codes: Vec<u32>,
}

/// Scans `postings` against `adt`, returning the `limit` best approximate
/// candidates ordered by ascending approximate distance.
#[must_use]
pub fn scan_postings(postings: &[PostingEntry], adt: &AsymmetricDistanceTable, limit: usize) -> Vec<(ObjectId, f32)> {
    let mut scored: Vec<(ObjectId, f32)> = postings
        .iter()
        .map(|entry| (entry.id, adt.approximate_distance(&entry.codes)))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(limit);
    scored
}

/// Re-scores the top `k * result_expansion` approximate candidates using
/// the exact metric against the original vectors, then returns the true
/// top-k.
pub fn refine(
    approximate: &[(ObjectId, f32)],
    k: usize,
    result_expansion: f32,
    mut exact_distance: impl FnMut(ObjectId) -> crate::error::Result<f32>,
) -> crate::error::Result<Vec<(ObjectId, f32)>> {
    let expansion_count = ((k as f32) * result_expansion).ceil() as usize;
    let candidates = &approximate[..approximate.len().min(expansion_count.max(k))];

    let mut rescored = Vec::with_capacity(candidates.len());
    for &(id, _) in candidates {
        rescored.push((id, exact_distance(id)?));
    }
    rescored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    rescored.truncate(k);
    Ok(rescored)
}
