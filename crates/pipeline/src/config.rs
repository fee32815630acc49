use treescan_morphology::TrunkParams;
use treescan_registration::IcpParams;

/// Parameters of the growth-detection pipeline.
///
/// The distance threshold separating "existing structure" from "new growth"
/// is a multiple of the expected registration error, so a well-aligned scan
/// pair can use the registration RMSE directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthParams {
    pub voxel_size: f32,
    pub sor_neighbors: usize,
    pub sor_std_multiplier: f32,
    /// Registration error of the scan pair, in cloud units.
    pub registration_rmse: f32,
    pub rmse_multiple: f32,
    /// Neighbor count checked by the growth filter.
    pub neighbor_k: usize,
    pub min_cluster_size: usize,
}

impl GrowthParams {
    /// Distance below which a point is considered part of the reference scan.
    pub fn threshold(&self) -> f32 {
        self.rmse_multiple * self.registration_rmse
    }
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            voxel_size: 0.001,
            sor_neighbors: 20,
            sor_std_multiplier: 2.0,
            registration_rmse: 0.009,
            rmse_multiple: 2.0,
            neighbor_k: 4,
            min_cluster_size: 40,
        }
    }
}

/// Parameters of the scan-alignment pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignParams {
    /// Outlier removal on the full scans before trunk extraction.
    pub pre_sor_neighbors: usize,
    pub pre_sor_std_multiplier: f32,
    /// Tighter outlier removal on the extracted trunks before ICP.
    pub trunk_sor_neighbors: usize,
    pub trunk_sor_std_multiplier: f32,
    /// Every k-th trunk point is kept for the ICP stage; 1 keeps all.
    pub icp_sample_stride: usize,
    pub trunk: TrunkParams,
    pub icp: IcpParams,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            pre_sor_neighbors: 10,
            pre_sor_std_multiplier: 5.0,
            trunk_sor_neighbors: 20,
            trunk_sor_std_multiplier: 3.0,
            icp_sample_stride: 2,
            trunk: TrunkParams::default(),
            icp: IcpParams::default(),
        }
    }
}

/// Parameters of the branch-measurement pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureParams {
    /// Clusters below this size are ignored.
    pub min_cluster_points: usize,
    /// When the input has no labels it is clustered first, with
    /// eps = this multiple of the cloud's mean point spacing.
    pub eps_spacing_multiple: f32,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            min_cluster_points: 5,
            eps_spacing_multiple: 12.0,
        }
    }
}
