use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, StageResult};

// ---------------------------------------------------------------------------
// SampleSeries – one normalised voltammogram
// ---------------------------------------------------------------------------

/// Aligned potential / signal vectors of a single scan.
///
/// Potential is strictly increasing and the signal is already in the analysis
/// convention (positive = current magnitude of interest).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSeries {
    potential: Vec<f64>,
    signal: Vec<f64>,
}

impl SampleSeries {
    /// Wrap already-normalised vectors, checking alignment and ordering.
    pub fn new(potential: Vec<f64>, signal: Vec<f64>) -> StageResult<Self> {
        check_aligned(&potential, &signal)?;
        check_increasing(&potential)?;
        Ok(Self { potential, signal })
    }

    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.potential.len()
    }

    /// Never true for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// Potential span `last − first`.
    pub fn span(&self) -> f64 {
        match (self.potential.first(), self.potential.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Equal, non-zero length and finite values.
pub(crate) fn check_aligned(potential: &[f64], signal: &[f64]) -> StageResult<()> {
    if potential.len() != signal.len() {
        return Err(AnalysisError::MismatchedLengths {
            potential: potential.len(),
            signal: signal.len(),
        });
    }
    if potential.is_empty() {
        return Err(AnalysisError::InvalidInput("empty input vectors".to_string()));
    }
    if let Some(i) = potential.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidInput(format!(
            "non-finite potential at index {i}"
        )));
    }
    if let Some(i) = signal.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidInput(format!(
            "non-finite signal at index {i}"
        )));
    }
    Ok(())
}

/// Potential must rise from one sample to the next.
pub(crate) fn check_increasing(potential: &[f64]) -> StageResult<()> {
    match potential.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => Err(AnalysisError::InvalidInput(format!(
            "potential is not strictly increasing at index {}",
            i + 1
        ))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Peak
// ---------------------------------------------------------------------------

/// A literal sample of the scan: potential and signal at one index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub voltage: f64,
    pub current: f64,
}

impl fmt::Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} V ({:.3e} A)", self.voltage, self.current)
    }
}

// ---------------------------------------------------------------------------
// ExclusionZone
// ---------------------------------------------------------------------------

/// Potential interval treated as "peak, not baseline" during the fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub lo: f64,
    pub hi: f64,
}

impl ExclusionZone {
    /// Zone of half-width `half_width` centred on `center`.
    pub fn around(center: f64, half_width: f64) -> Self {
        Self {
            lo: center - half_width,
            hi: center + half_width,
        }
    }

    /// Strict interior test; the boundaries themselves are not excluded.
    pub fn contains(&self, potential: f64) -> bool {
        potential > self.lo && potential < self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}
