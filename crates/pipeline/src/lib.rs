#![forbid(unsafe_code)]

pub mod align;
pub mod batch;
pub mod config;
pub mod error;
pub mod growth;
pub mod measure;

pub use align::{align_scans, AlignResult};
pub use batch::{pair_scans, run_growth_batch, BatchSummary, ScanPair};
pub use config::{AlignParams, GrowthParams, MeasureParams};
pub use error::PipelineError;
pub use growth::detect_growth;
pub use measure::{format_report, measure_scan, MeasurementReport};
