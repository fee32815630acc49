use std::fmt;
use std::io;
use treescan_morphology::TrunkError;

/// Errors surfaced by the per-file pipelines.
///
/// Batch orchestration logs these and moves on to the next scan pair; the
/// CLI binaries surface them through `anyhow`.
#[derive(Debug)]
pub enum PipelineError {
    Io(io::Error),
    Trunk(TrunkError),
    /// A stage emptied the cloud, leaving nothing for the stages after it.
    EmptyStage(&'static str),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(e) => write!(f, "i/o error: {}", e),
            PipelineError::Trunk(e) => write!(f, "trunk extraction failed: {}", e),
            PipelineError::EmptyStage(stage) => {
                write!(f, "no points left after the {} stage", stage)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io(e) => Some(e),
            PipelineError::Trunk(e) => Some(e),
            PipelineError::EmptyStage(_) => None,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(e: io::Error) -> Self {
        PipelineError::Io(e)
    }
}

impl From<TrunkError> for PipelineError {
    fn from(e: TrunkError) -> Self {
        PipelineError::Trunk(e)
    }
}
