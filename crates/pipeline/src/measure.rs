use log::info;
use treescan_core::PointCloud;
use treescan_morphology::{measure_branches, BranchMetrics};
use treescan_segmentation::dbscan;
use treescan_spatial::mean_nearest_neighbor_distance;

use crate::config::MeasureParams;

/// Per-scan measurement report: one row per branch plus aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementReport {
    pub branches: Vec<BranchMetrics>,
    pub total_path_length: f32,
    pub total_principal_length: f32,
    pub mean_inclination_degrees: f32,
}

/// Measure every branch cluster of a cloud.
///
/// Thin wrapper over [`measure_branches`] that also aggregates totals the
/// way a per-tree summary row needs them. Unlabeled input is clustered
/// first; an empty cloud yields an empty report.
pub fn measure_scan(cloud: &PointCloud, params: &MeasureParams) -> MeasurementReport {
    let cloud = cluster_if_unlabeled(cloud, params);
    let branches = measure_branches(&cloud, params.min_cluster_points);
    info!("measured {} branches", branches.len());

    let total_path_length = branches.iter().map(|b| b.path_length).sum();
    let total_principal_length = branches.iter().map(|b| b.principal_length).sum();
    let mean_inclination_degrees = if branches.is_empty() {
        0.0
    } else {
        branches.iter().map(|b| b.inclination_degrees).sum::<f32>() / branches.len() as f32
    };

    MeasurementReport {
        branches,
        total_path_length,
        total_principal_length,
        mean_inclination_degrees,
    }
}

/// Cluster an unlabeled cloud so it can be measured, choosing eps from the
/// cloud's own sampling density. Labeled clouds pass through untouched.
fn cluster_if_unlabeled(cloud: &PointCloud, params: &MeasureParams) -> PointCloud {
    if cloud.labels.is_some() {
        return cloud.clone();
    }
    match mean_nearest_neighbor_distance(cloud) {
        Some(spacing) => {
            let eps = params.eps_spacing_multiple * spacing;
            info!("clustering unlabeled cloud, spacing {}, eps {}", spacing, eps);
            let labels = dbscan(cloud, eps, params.min_cluster_points);
            cloud.clone().with_labels(labels).without_noise()
        }
        None => cloud.clone(),
    }
}

/// Render the report as a text table, one branch per row.
///
/// Columns are label, point count, principal length, inclination and path
/// length; the final row aggregates.
pub fn format_report(report: &MeasurementReport) -> String {
    let mut out = String::from("label points principal_length inclination_deg path_length\n");
    for b in &report.branches {
        out.push_str(&format!(
            "{} {} {:.8} {:.8} {:.8}\n",
            b.label, b.point_count, b.principal_length, b.inclination_degrees, b.path_length
        ));
    }
    out.push_str(&format!(
        "total {} {:.8} {:.8} {:.8}\n",
        report.branches.len(),
        report.total_principal_length,
        report.mean_inclination_degrees,
        report.total_path_length
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use treescan_core::PointCloud;

    fn two_branch_cloud() -> PointCloud {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        let mut labels = Vec::new();
        // Horizontal branch along x, 1.0 long.
        for i in 0..11 {
            x.push(i as f32 * 0.1);
            y.push(0.0);
            z.push(0.0);
            labels.push(0);
        }
        // Vertical branch, 0.5 long, off to the side.
        for i in 0..6 {
            x.push(5.0);
            y.push(5.0);
            z.push(i as f32 * 0.1);
            labels.push(1);
        }
        PointCloud::from_xyz(x, y, z).with_labels(labels)
    }

    #[test]
    fn aggregates_cover_both_branches() {
        let report = measure_scan(&two_branch_cloud(), &MeasureParams::default());
        assert_eq!(report.branches.len(), 2);
        assert_relative_eq!(report.total_path_length, 1.5, epsilon = 1e-4);
        assert_relative_eq!(report.total_principal_length, 1.5, epsilon = 1e-4);
        assert_relative_eq!(report.mean_inclination_degrees, 45.0, epsilon = 0.1);
    }

    #[test]
    fn empty_cloud_gives_empty_report() {
        let report = measure_scan(&PointCloud::new(), &MeasureParams::default());
        assert!(report.branches.is_empty());
        assert_eq!(report.total_path_length, 0.0);
        assert_eq!(report.mean_inclination_degrees, 0.0);
    }

    #[test]
    fn unlabeled_input_is_clustered_first() {
        let mut unlabeled = two_branch_cloud();
        unlabeled.labels = None;
        // Mean spacing is ~0.1, so eps = 12 * 0.1 keeps each branch one
        // cluster while the branches stay far apart.
        let report = measure_scan(&unlabeled, &MeasureParams::default());
        assert_eq!(report.branches.len(), 2);
        assert_relative_eq!(report.total_path_length, 1.5, epsilon = 1e-4);
    }

    #[test]
    fn report_table_has_one_row_per_branch_plus_total() {
        let report = measure_scan(&two_branch_cloud(), &MeasureParams::default());
        let table = format_report(&report);
        assert_eq!(table.lines().count(), 4);
        assert!(table.lines().last().unwrap().starts_with("total 2 "));
    }
}
