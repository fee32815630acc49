use log::{debug, info};
use treescan_core::PointCloud;
use treescan_filters::{extract_new_growth, statistical_outlier_removal, voxel_downsample};
use treescan_segmentation::dbscan;

use crate::config::GrowthParams;
use crate::error::PipelineError;

/// Find the structure present in `after` but not in `before`.
///
/// Both scans must already be registered to each other. The stages are
/// voxel downsampling, statistical outlier removal, the nearest-neighbor
/// growth filter, and DBSCAN clustering of what remains. The returned cloud
/// carries cluster labels, noise points already dropped, so tiny speckle
/// never shows up as growth.
pub fn detect_growth(
    before: &PointCloud,
    after: &PointCloud,
    params: &GrowthParams,
) -> Result<PointCloud, PipelineError> {
    let threshold = params.threshold();
    info!(
        "growth detection: {} reference points, {} candidate points, threshold {}",
        before.len(),
        after.len(),
        threshold
    );

    let before = preprocess(before, params);
    let after = preprocess(after, params);
    if after.is_empty() {
        return Err(PipelineError::EmptyStage("outlier removal"));
    }

    let candidates = extract_new_growth(&before, &after, params.neighbor_k, threshold);
    debug!("{} points past the growth filter", candidates.len());
    if candidates.is_empty() {
        return Err(PipelineError::EmptyStage("growth filter"));
    }

    let labels = dbscan(&candidates, threshold, params.min_cluster_size);
    let clustered = candidates.with_labels(labels).without_noise();
    info!(
        "{} growth points in {} clusters",
        clustered.len(),
        clustered.cluster_labels().len()
    );

    Ok(clustered)
}

fn preprocess(cloud: &PointCloud, params: &GrowthParams) -> PointCloud {
    let down = voxel_downsample(cloud, params.voxel_size);
    debug!("downsampled {} -> {} points", cloud.len(), down.len());
    statistical_outlier_removal(&down, params.sor_neighbors, params.sor_std_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treescan_core::PointCloud;

    fn grid_cloud(nx: usize, ny: usize, spacing: f32, z: f32) -> PointCloud {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut zs = Vec::new();
        for i in 0..nx {
            for j in 0..ny {
                x.push(i as f32 * spacing);
                y.push(j as f32 * spacing);
                zs.push(z);
            }
        }
        PointCloud::from_xyz(x, y, zs)
    }

    fn relaxed_params() -> GrowthParams {
        // Coarse synthetic data: millimeter-scale defaults would reject it.
        GrowthParams {
            voxel_size: 0.005,
            sor_neighbors: 4,
            sor_std_multiplier: 10.0,
            registration_rmse: 0.009,
            rmse_multiple: 2.0,
            neighbor_k: 4,
            min_cluster_size: 5,
        }
    }

    #[test]
    fn identical_scans_have_no_growth() {
        let scan = grid_cloud(10, 10, 0.01, 0.0);
        let err = detect_growth(&scan, &scan.clone(), &relaxed_params()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyStage("growth filter")));
    }

    #[test]
    fn added_patch_is_detected_as_one_cluster() {
        let before = grid_cloud(20, 20, 0.01, 0.0);
        // Same structure plus a dense patch well above the old one.
        let mut after = before.clone();
        let patch = grid_cloud(5, 5, 0.01, 1.0);
        after.x.extend_from_slice(&patch.x);
        after.y.extend_from_slice(&patch.y);
        after.z.extend_from_slice(&patch.z);

        let growth = detect_growth(&before, &after, &relaxed_params()).unwrap();
        assert!(!growth.is_empty());
        assert_eq!(growth.cluster_labels(), vec![0]);
        // Everything detected sits at the patch height.
        assert!(growth.z.iter().all(|&z| (z - 1.0).abs() < 1e-6));
    }
}
