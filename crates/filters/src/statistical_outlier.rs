use treescan_core::PointCloud;
use treescan_spatial::KdTree;

/// Remove points whose mean k-nearest-neighbor distance exceeds the global
/// mean by more than `std_mul` standard deviations.
///
/// Scanner noise around thin branches shows up as points with abnormally
/// sparse neighborhoods; both the growth and alignment pipelines run this
/// before any geometric analysis. A label column is carried through for the
/// surviving points.
pub fn statistical_outlier_removal(cloud: &PointCloud, k: usize, std_mul: f32) -> PointCloud {
    if cloud.is_empty() || k == 0 {
        return PointCloud::new();
    }

    // Single point: no neighbors to compare against, keep it
    if cloud.len() == 1 {
        return cloud.clone();
    }

    let tree = KdTree::build(cloud);

    // knn returns the query point itself as the nearest hit (distance 0), so
    // request k+1 neighbors and skip the self-match.
    let mean_dists: Vec<f32> = (0..cloud.len())
        .map(|i| {
            let q = cloud.point(i);
            if !q.iter().all(|v| v.is_finite()) {
                return f32::INFINITY;
            }
            let (_, dists) = tree.knn(&q, k + 1);
            let neighbor_dists = if dists.len() > 1 {
                &dists[1..]
            } else {
                &dists[..]
            };
            if neighbor_dists.is_empty() {
                return f32::INFINITY;
            }
            let sum: f32 = neighbor_dists.iter().sum();
            sum / neighbor_dists.len() as f32
        })
        .collect();

    let finite_dists: Vec<f32> = mean_dists
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .collect();

    if finite_dists.is_empty() {
        return PointCloud::new();
    }

    let n = finite_dists.len() as f32;
    let global_mean: f32 = finite_dists.iter().sum::<f32>() / n;
    let variance: f32 = finite_dists
        .iter()
        .map(|d| (d - global_mean).powi(2))
        .sum::<f32>()
        / n;
    let global_stddev = variance.sqrt();

    let threshold = global_mean + std_mul * global_stddev;

    let keep: Vec<usize> = (0..cloud.len())
        .filter(|&i| mean_dists[i] <= threshold)
        .collect();

    cloud.select(&keep)
}
