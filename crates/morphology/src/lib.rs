#![forbid(unsafe_code)]

pub mod branch_metrics;
pub mod path_length;
pub mod trunk;

pub use branch_metrics::{measure_branches, BranchMetrics};
pub use path_length::estimate_path_length;
pub use trunk::{extract_trunk, TrunkError, TrunkParams, TrunkResult};
