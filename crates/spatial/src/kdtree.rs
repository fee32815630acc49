use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use std::num::NonZero;
use treescan_core::PointCloud;

/// A kd-tree for nearest-neighbor and radius queries on 3D scans.
///
/// Thin wrapper over kiddo's `ImmutableKdTree`: built once from a cloud,
/// read-only afterwards. Stored items are `u32` indices back into the
/// originating [`PointCloud`].
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f32, u32, 3, 32>,
    num_points: usize,
}

impl KdTree {
    pub fn build(cloud: &PointCloud) -> Self {
        let n = cloud.len();
        if n == 0 {
            return Self {
                tree: ImmutableKdTree::new_from_slice(&[]),
                num_points: 0,
            };
        }

        let points: Vec<[f32; 3]> = cloud.to_points();
        let tree = ImmutableKdTree::new_from_slice(&points);

        Self {
            tree,
            num_points: n,
        }
    }

    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    /// The `k` nearest neighbors to `query` as `(indices, distances)`.
    ///
    /// Distances are Euclidean (not squared), ascending. Returns empty when
    /// `k == 0`, the tree is empty, or the query is non-finite; when
    /// `k > len()` all points are returned.
    pub fn knn(&self, query: &[f32; 3], k: usize) -> (Vec<usize>, Vec<f32>) {
        if k == 0 || self.is_empty() || !query.iter().all(|v| v.is_finite()) {
            return (Vec::new(), Vec::new());
        }

        let nz_k = NonZero::new(k).unwrap();
        let results = self.tree.nearest_n::<SquaredEuclidean>(query, nz_k);

        let mut indices = Vec::with_capacity(results.len());
        let mut distances = Vec::with_capacity(results.len());
        for nn in results {
            indices.push(nn.item as usize);
            distances.push(nn.distance.sqrt());
        }

        (indices, distances)
    }

    /// The single nearest neighbor to `query`, or `None` on an empty tree
    /// or non-finite query.
    pub fn nearest(&self, query: &[f32; 3]) -> Option<(usize, f32)> {
        let (indices, distances) = self.knn(query, 1);
        indices
            .first()
            .zip(distances.first())
            .map(|(&i, &d)| (i, d))
    }

    /// Indices of all points within `radius` (Euclidean, inclusive) of
    /// `query`, sorted ascending for deterministic output.
    ///
    /// Returns empty when the tree is empty, the radius is non-positive or
    /// non-finite, or the query is non-finite.
    pub fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if self.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.iter().all(|v| v.is_finite())
        {
            return Vec::new();
        }

        let radius_sq = radius * radius;

        // kiddo's `within_unsorted` compares with strict `<`; widen the query
        // radius slightly and post-filter with `<=` so points exactly on the
        // boundary are included.
        let query_radius_sq = radius_sq + f32::EPSILON * radius_sq.max(1.0);

        let results = self
            .tree
            .within_unsorted::<SquaredEuclidean>(query, query_radius_sq);

        let mut indices: Vec<usize> = results
            .into_iter()
            .filter(|nn| nn.distance <= radius_sq)
            .map(|nn| nn.item as usize)
            .collect();

        indices.sort_unstable();
        indices
    }
}
