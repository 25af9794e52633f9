use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// AnalysisError – what went wrong inside a single stage
// ---------------------------------------------------------------------------

/// Failure raised by one of the numeric stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Too few samples for the requested operation.
    #[error("insufficient data: got {got} samples, need at least {min}")]
    InsufficientData { got: usize, min: usize },

    /// Potential and signal vectors are not aligned.
    #[error("potential has {potential} samples but signal has {signal}")]
    MismatchedLengths { potential: usize, signal: usize },

    /// Input values that can never be analysed (empty, non-finite, unsorted…).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A pipeline parameter is outside its admissible range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The penalized least-squares system is singular or produced non-finite values.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Anything not covered by the kinds above.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

pub type StageResult<T> = Result<T, AnalysisError>;

// ---------------------------------------------------------------------------
// Stage tagging at the orchestrator boundary
// ---------------------------------------------------------------------------

/// Pipeline stage in which a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    Smoothing,
    ApproximatePeak,
    Baseline,
    Correction,
    FinalPeak,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Smoothing => "smoothing",
            Stage::ApproximatePeak => "approximate peak",
            Stage::Baseline => "baseline",
            Stage::Correction => "correction",
            Stage::FinalPeak => "final peak",
        };
        write!(f, "{name}")
    }
}

/// An [`AnalysisError`] tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: AnalysisError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: AnalysisError) -> Self {
        Self { stage, source }
    }

    /// The underlying error kind, for callers that branch on it.
    pub fn kind(&self) -> &AnalysisError {
        &self.source
    }
}

/// Attach a [`Stage`] to a stage-local result.
pub(crate) trait StageContext<T> {
    fn in_stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for StageResult<T> {
    fn in_stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError::new(stage, source))
    }
}
