//! Rotation matrix and codebook training.

use crate::quantized::kmeans::{kmeans, nearest_centroid};

/// An optional `dim x dim` orthogonal matrix applied to vectors and
/// codebooks before quantisation, to decorrelate subspaces.
#[derive(Debug, Clone)]
pub struct Rotation {
    dim: usize,
    matrix: Vec<Vec<f32>>,
}

impl Rotation {
    /// The no-op rotation (identity matrix).
    #[must_use]
    pub fn identity(dim: usize) -> Self {
        let mut matrix = vec![vec![0.0; dim]; dim];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { dim, matrix }
    }

    /// A pseudo-random orthogonal rotation, seeded deterministically and
    /// orthonormalised by Gram-Schmidt. Decorrelates subspaces better than
    /// the identity without the iterative refinement a full OPQ training
    /// loop would need.
    #[must_use]
    pub fn random_orthogonal(dim: usize, seed: u64) -> Self {
        let mut state = seed.max(1);
        let mut next_rand = move || {
            // xorshift64, same generator shape as `kmeans::kmeans`'s
            // centroid-seeding PRNG.
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut matrix: Vec<Vec<f32>> = (0..dim)
            .map(|_| (0..dim).map(|_| ((next_rand() % 2000) as f32 - 1000.0) / 1000.0).collect())
            .collect();

        for i in 0..dim {
            for j in 0..i {
                let proj: f32 = matrix[i].iter().zip(&matrix[j]).map(|(x, y)| x * y).sum();
                for d in 0..dim {
                    matrix[i][d] -= proj * matrix[j][d];
                }
            }
            let norm: f32 = matrix[i].iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 1e-6 {
                for d in 0..dim {
                    matrix[i][d] /= norm;
                }
            } else {
                // Degenerate row after projection: fall back to the
                // corresponding identity basis vector so the matrix stays
                // orthonormal.
                matrix[i] = (0..dim).map(|d| if d == i { 1.0 } else { 0.0 }).collect();
            }
        }

        Self { dim, matrix }
    }

    /// Applies the rotation to `v`, returning a new vector of the same
    /// dimension.
    #[must_use]
    pub fn apply(&self, v: &[f32]) -> Vec<f32> {
        debug_assert_eq!(v.len(), self.dim);
        (0..self.dim)
            .map(|i| self.matrix[i].iter().zip(v).map(|(m, x)| m * x).sum())
            .collect()
    }
}

/// `num_subspaces x codebook_size` centroids, one codebook per subspace.
#[derive(Debug, Clone)]
pub struct Codebook {
    /// Number of equal-length chunks each rotated, residual vector is split into.
    pub num_subspaces: usize,
    /// Centroids per subspace; selects a per-code width of 4/8/16 bits.
    pub codebook_size: usize,
    /// Dimension of each subspace (`padded_dim / num_subspaces`).
    pub sub_dim: usize,
    /// `centroids[subspace][code] -> sub_dim-length centroid`.
    pub centroids: Vec<Vec<Vec<f32>>>,
}

impl Codebook {
    /// Trains one codebook per subspace from `residuals` (already
    /// blob-centroid-subtracted, rotated vectors).
    #[must_use]
    pub fn train(residuals: &[Vec<f32>], num_subspaces: usize, codebook_size: usize, dim: usize) -> Self {
        let sub_dim = dim / num_subspaces;
        let mut centroids = Vec::with_capacity(num_subspaces);
        for s in 0..num_subspaces {
            let sub_points: Vec<Vec<f32>> = residuals
                .iter()
                .map(|r| r[s * sub_dim..(s + 1) * sub_dim].to_vec())
                .collect();
            centroids.push(kmeans(&sub_points, codebook_size, sub_dim, 15, 0x9E37_79B9_u64 + s as u64));
        }
        Self {
            num_subspaces,
            codebook_size,
            sub_dim,
            centroids,
        }
    }

    /// Encodes `residual` (already split conceptually into `num_subspaces`
    /// chunks) into one code per subspace.
    #[must_use]
    pub fn encode(&self, residual: &[f32]) -> Vec<u32> {
        (0..self.num_subspaces)
            .map(|s| {
                let sub = &residual[s * self.sub_dim..(s + 1) * self.sub_dim];
                nearest_centroid(sub, &self.centroids[s]) as u32
            })
            .collect()
    }

    /// Reconstructs an approximate vector from `codes`.
    #[must_use]
    pub fn decode(&self, codes: &[u32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.sub_dim * self.num_subspaces);
        for (s, &code) in codes.iter().enumerate() {
            out.extend_from_slice(&self.centroids[s][code as usize]);
        }
        out
    }
}

/// Coarse partition identifier assigned by hierarchical k-means.
pub type BlobId = u32;

/// Three-layer hierarchical k-means routing the spec describes as
/// "first-objects -> first-clusters -> second-objects -> second-clusters
/// -> third-clusters": each layer re-clusters the previous layer's
/// centroids so a large `num_blobs` doesn't require a single k-means pass
/// over every point with every centroid.
#[must_use]
pub fn hierarchical_blob_centroids(points: &[Vec<f32>], num_blobs: usize, dim: usize) -> Vec<Vec<f32>> {
    if points.len() <= num_blobs {
        return points.to_vec();
    }
    let first_k = (num_blobs * 4).min(points.len());
    let first_clusters = kmeans(points, first_k, dim, 10, 1);
    let second_k = (num_blobs * 2).min(first_clusters.len());
    let second_clusters = kmeans(&first_clusters, second_k, dim, 10, 2);
    kmeans(&second_clusters, num_blobs.min(second_clusters.len()), dim, 10, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rotation_is_a_no_op() {
        let r = Rotation::identity(3);
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(r.apply(&v), v);
    }

    #[test]
    fn random_orthogonal_rotation_preserves_vector_norm() {
        let r = Rotation::random_orthogonal(6, 7);
        let v = vec![1.0, -2.0, 3.0, 0.5, -0.5, 2.0];
        let rotated = r.apply(&v);
        let norm = |x: &[f32]| x.iter().map(|e| e * e).sum::<f32>().sqrt();
        assert!((norm(&rotated) - norm(&v)).abs() < 1e-3);
    }

    #[test]
    fn random_orthogonal_rotation_rows_are_orthonormal() {
        let r = Rotation::random_orthogonal(4, 99);
        for i in 0..4 {
            for j in 0..4 {
                let dot: f32 = r.matrix[i].iter().zip(&r.matrix[j]).map(|(a, b)| a * b).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-3, "row {i} . row {j} = {dot}");
            }
        }
    }

    #[test]
    fn codebook_encode_decode_round_trips_approximately() {
        let residuals: Vec<Vec<f32>> = (0..64)
            .map(|i| vec![(i % 8) as f32, ((i / 8) % 8) as f32])
            .collect();
        let cb = Codebook::train(&residuals, 1, 16, 2);
        let codes = cb.encode(&residuals[5]);
        let decoded = cb.decode(&codes);
        let err: f32 = decoded
            .iter()
            .zip(&residuals[5])
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        assert!(err < 4.0);
    }

    #[test]
    fn hierarchical_centroids_returns_requested_count_when_enough_points() {
        let points: Vec<Vec<f32>> = (0..200).map(|i| vec![i as f32, (i * 2) as f32]).collect();
        let centroids = hierarchical_blob_centroids(&points, 8, 2);
        assert_eq!(centroids.len(), 8);
    }
}
