use log::debug;
use serde::Serialize;

use super::baseline::{estimate_baseline, Termination};
use super::peak::{locate_peak, search_region, PeakLocation};
use super::smoothing::{smooth, MIN_SAMPLES};
use crate::config::PipelineConfig;
use crate::data::model::{check_aligned, check_increasing, ExclusionZone, Peak, SampleSeries};
use crate::error::{AnalysisError, PipelineError, Stage, StageContext};

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Every intermediate vector and estimate of one pipeline run, all aligned
/// index-for-index with `potential`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub potential: Vec<f64>,
    pub raw: Vec<f64>,
    pub smoothed: Vec<f64>,
    pub baseline: Vec<f64>,
    pub corrected: Vec<f64>,
    pub approximate_peak: PeakLocation,
    pub final_peak: PeakLocation,
    pub exclusion_zone: ExclusionZone,
    pub baseline_iterations: usize,
    pub baseline_termination: Termination,
}

/// Compact, vector-free view of an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub samples: usize,
    pub approximate_peak: Peak,
    pub final_peak: Peak,
    pub low_confidence: bool,
    pub exclusion_zone: ExclusionZone,
    pub baseline_iterations: usize,
    pub baseline_termination: Termination,
}

impl AnalysisResult {
    pub fn len(&self) -> usize {
        self.potential.len()
    }

    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// Baseline-corrected peak.
    pub fn peak(&self) -> Peak {
        self.final_peak.peak
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            samples: self.len(),
            approximate_peak: self.approximate_peak.peak,
            final_peak: self.final_peak.peak,
            low_confidence: self.approximate_peak.is_low_confidence()
                || self.final_peak.is_low_confidence(),
            exclusion_zone: self.exclusion_zone,
            baseline_iterations: self.baseline_iterations,
            baseline_termination: self.baseline_termination,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run the pipeline on a prepared [`SampleSeries`].
pub fn analyze_series(
    series: &SampleSeries,
    config: &PipelineConfig,
) -> Result<AnalysisResult, PipelineError> {
    analyze(series.potential(), series.signal(), config)
}

/// smooth → approximate peak → baseline → subtract → final peak.
///
/// `potential` must be strictly increasing; use
/// [`SampleSeries::from_measurements`] for descending sweeps. Pure: identical
/// inputs always give identical outputs. Every failure is tagged with the
/// [`Stage`] it came from.
pub fn analyze(
    potential: &[f64],
    signal: &[f64],
    config: &PipelineConfig,
) -> Result<AnalysisResult, PipelineError> {
    config.validate().in_stage(Stage::Validation)?;
    check_aligned(potential, signal).in_stage(Stage::Validation)?;
    check_increasing(potential).in_stage(Stage::Validation)?;

    let n = signal.len();
    let smoothed = smooth(signal, &config.smoothing).in_stage(Stage::Smoothing)?;

    let (lo, hi) = search_region(n, config.peak_search.margin_ratio);
    if lo >= hi {
        // Unreachable once the smoother accepted the input, since margin ratio < 0.5.
        return Err(PipelineError::new(
            Stage::ApproximatePeak,
            AnalysisError::InsufficientData {
                got: n,
                min: MIN_SAMPLES,
            },
        ));
    }

    let approximate_peak = locate_peak(&smoothed, potential, &config.peak_search);
    debug!("approximate peak: {}", approximate_peak.peak);

    let fit = estimate_baseline(
        &smoothed,
        potential,
        approximate_peak.peak.voltage,
        &config.baseline,
    )
    .in_stage(Stage::Baseline)?;

    let corrected = subtract(&smoothed, &fit.baseline).in_stage(Stage::Correction)?;

    let final_peak = locate_peak(&corrected, potential, &config.peak_search);
    debug!(
        "final peak: {} after {} baseline iteration(s)",
        final_peak.peak, fit.iterations
    );

    Ok(AnalysisResult {
        potential: potential.to_vec(),
        raw: signal.to_vec(),
        smoothed,
        baseline: fit.baseline,
        corrected,
        approximate_peak,
        final_peak,
        exclusion_zone: fit.zone,
        baseline_iterations: fit.iterations,
        baseline_termination: fit.termination,
    })
}

/// Element-wise `signal − baseline`.
fn subtract(signal: &[f64], baseline: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    if signal.len() != baseline.len() {
        return Err(AnalysisError::Unexpected(format!(
            "baseline has {} samples, signal has {}",
            baseline.len(),
            signal.len()
        )));
    }
    Ok(signal.iter().zip(baseline).map(|(s, b)| s - b).collect())
}
