use crate::KdTree;
use treescan_core::PointCloud;

/// Mean distance from each point to its nearest other point.
///
/// Estimates the sampling spacing of a scan; the clustering pipeline derives
/// its DBSCAN eps from a multiple of this value. Returns `None` for clouds
/// with fewer than two points, where no point has a neighbor.
pub fn mean_nearest_neighbor_distance(cloud: &PointCloud) -> Option<f32> {
    if cloud.len() < 2 {
        return None;
    }

    let tree = KdTree::build(cloud);
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for p in cloud.iter_points() {
        // k = 2: the first hit is the query point itself at distance 0.
        let (_, dists) = tree.knn(&p, 2);
        if let Some(&d) = dists.get(1) {
            sum += d as f64;
            count += 1;
        }
    }

    if count == 0 {
        None
    } else {
        Some((sum / count as f64) as f32)
    }
}
