use treescan_core::PointCloud;
use treescan_spatial::KdTree;

/// Extract points of a later scan that have no counterpart in a reference
/// scan: new growth between two scanning campaigns.
///
/// For each point of `later`, the `k` nearest neighbors in `reference` are
/// queried; the point is kept only when every returned distance is strictly
/// greater than `threshold`. Neighbors missing because the reference holds
/// fewer than `k` points count as beyond the threshold, so a later scan
/// compared against an empty reference is returned whole.
///
/// The threshold is typically a small multiple of the registration RMSE of
/// the two scans, so residual alignment error is not mistaken for growth.
pub fn extract_new_growth(
    reference: &PointCloud,
    later: &PointCloud,
    k: usize,
    threshold: f32,
) -> PointCloud {
    if later.is_empty() {
        return PointCloud::new();
    }
    if reference.is_empty() || k == 0 {
        return later.clone();
    }

    let tree = KdTree::build(reference);

    let keep: Vec<usize> = (0..later.len())
        .filter(|&i| {
            let q = later.point(i);
            let (_, dists) = tree.knn(&q, k);
            // Non-finite query points return no neighbors; treat them as
            // unmatched and drop them here rather than labeling them growth.
            if dists.is_empty() && !q.iter().all(|v| v.is_finite()) {
                return false;
            }
            dists.iter().all(|&d| d > threshold)
        })
        .collect();

    later.select(&keep)
}
