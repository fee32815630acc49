#![forbid(unsafe_code)]

pub mod growth;
pub mod statistical_outlier;
pub mod uniform_downsample;
pub mod voxel_downsample;

pub use growth::extract_new_growth;
pub use statistical_outlier::statistical_outlier_removal;
pub use uniform_downsample::uniform_downsample;
pub use voxel_downsample::voxel_downsample;
