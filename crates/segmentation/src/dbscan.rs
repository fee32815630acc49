use std::collections::VecDeque;
use treescan_core::{PointCloud, NOISE_LABEL};
use treescan_spatial::KdTree;

/// Density-based clustering (DBSCAN) over a 3D point cloud.
///
/// A point is a *core* point when at least `min_samples` points (itself
/// included) lie within `eps` of it. Clusters grow by breadth-first
/// expansion from core points; non-core points reachable from a cluster
/// become border members of it. Everything else is labeled
/// [`NOISE_LABEL`].
///
/// Returns one label per input point. Cluster ids are assigned in order of
/// discovery (ascending seed index), so the output is deterministic.
/// Non-positive `eps` or `min_samples == 0` labels everything as noise.
pub fn dbscan(cloud: &PointCloud, eps: f32, min_samples: usize) -> Vec<i32> {
    let n = cloud.len();
    if n == 0 {
        return Vec::new();
    }
    if eps <= 0.0 || !eps.is_finite() || min_samples == 0 {
        return vec![NOISE_LABEL; n];
    }

    let tree = KdTree::build(cloud);
    let mut labels = vec![NOISE_LABEL; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0i32;

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let neighbors = tree.radius_search(&cloud.point(seed), eps);
        if neighbors.len() < min_samples {
            // Not a core point; may still be claimed as a border point by a
            // later expansion, so only the visited flag is set.
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[seed] = cluster;

        let mut queue: VecDeque<usize> = neighbors.into();
        while let Some(current) = queue.pop_front() {
            if labels[current] == NOISE_LABEL {
                labels[current] = cluster;
            }
            if visited[current] {
                continue;
            }
            visited[current] = true;

            let current_neighbors = tree.radius_search(&cloud.point(current), eps);
            if current_neighbors.len() >= min_samples {
                queue.extend(current_neighbors);
            }
        }
    }

    labels
}
