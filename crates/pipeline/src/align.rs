use log::{debug, info};
use treescan_core::PointCloud;
use treescan_filters::{statistical_outlier_removal, uniform_downsample};
use treescan_morphology::extract_trunk;
use treescan_registration::{apply_transform, icp_point_to_point, IcpResult, RigidTransform};

use crate::config::AlignParams;
use crate::error::PipelineError;

/// Outcome of aligning a moving scan onto a fixed one.
#[derive(Debug, Clone)]
pub struct AlignResult {
    /// The moving cloud under the total transform.
    pub aligned: PointCloud,
    /// Total transform: corner-seeded translation composed with the ICP
    /// refinement.
    pub transform: RigidTransform,
    pub icp: IcpResult,
}

/// Align `moving` onto `fixed` using the trunks as registration anchors.
///
/// Crowns change shape between scans (growth, pruning, wind) but trunks do
/// not, so both scans are reduced to their trunks first. The translation
/// between the two trunk reference corners seeds the alignment; ICP between
/// the cleaned trunks refines it. The resulting transform is then applied to
/// the complete moving cloud.
pub fn align_scans(
    fixed: &PointCloud,
    moving: &PointCloud,
    params: &AlignParams,
) -> Result<AlignResult, PipelineError> {
    info!(
        "aligning {} moving points onto {} fixed points",
        moving.len(),
        fixed.len()
    );

    let fixed_clean =
        statistical_outlier_removal(fixed, params.pre_sor_neighbors, params.pre_sor_std_multiplier);
    let moving_clean = statistical_outlier_removal(
        moving,
        params.pre_sor_neighbors,
        params.pre_sor_std_multiplier,
    );

    let fixed_trunk = extract_trunk(&fixed_clean, &params.trunk)?;
    let moving_trunk = extract_trunk(&moving_clean, &params.trunk)?;
    debug!(
        "trunks: {} fixed points, {} moving points",
        fixed_trunk.trunk.len(),
        moving_trunk.trunk.len()
    );

    let seed = RigidTransform::from_translation([
        fixed_trunk.reference_corner[0] - moving_trunk.reference_corner[0],
        fixed_trunk.reference_corner[1] - moving_trunk.reference_corner[1],
        fixed_trunk.reference_corner[2] - moving_trunk.reference_corner[2],
    ]);

    let fixed_anchor = uniform_downsample(
        &statistical_outlier_removal(
            &fixed_trunk.trunk,
            params.trunk_sor_neighbors,
            params.trunk_sor_std_multiplier,
        ),
        params.icp_sample_stride,
    );
    let moving_anchor = apply_transform(
        &uniform_downsample(
            &statistical_outlier_removal(
                &moving_trunk.trunk,
                params.trunk_sor_neighbors,
                params.trunk_sor_std_multiplier,
            ),
            params.icp_sample_stride,
        ),
        &seed,
    );
    if fixed_anchor.is_empty() || moving_anchor.is_empty() {
        return Err(PipelineError::EmptyStage("trunk outlier removal"));
    }

    let icp = icp_point_to_point(&moving_anchor, &fixed_anchor, &params.icp);
    info!(
        "icp finished after {} iterations, rmse {}, converged: {}",
        icp.num_iterations, icp.rmse, icp.converged
    );

    // Seed first, then the refinement found on the seeded trunks.
    let transform = seed.compose(&icp.transform);
    let aligned = apply_transform(moving, &transform);

    Ok(AlignResult {
        aligned,
        transform,
        icp,
    })
}
