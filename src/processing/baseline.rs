use log::{debug, warn};
use serde::Serialize;

use super::penalized::solve_penalized;
use crate::config::BaselineConfig;
use crate::data::model::ExclusionZone;
use crate::error::{AnalysisError, StageResult};

/// Smallest weight a sample can receive; keeps every weight in `(0, 1]`.
pub const MIN_WEIGHT: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Why the reweighting loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative weight change fell below the tolerance.
    Converged,
    /// The baseline no longer lies above the data anywhere that could be
    /// used to estimate a residual scale.
    NoNegativeResiduals,
    /// The iteration cap was reached first.
    IterationCap,
}

/// Output of [`estimate_baseline`].
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineFit {
    pub baseline: Vec<f64>,
    pub zone: ExclusionZone,
    /// Weights used for the final fit.
    pub weights: Vec<f64>,
    pub iterations: usize,
    pub termination: Termination,
}

impl BaselineFit {
    pub fn converged(&self) -> bool {
        self.termination != Termination::IterationCap
    }
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Exclusion zone of half-width `ratio · span` around `peak_voltage`.
pub fn exclusion_zone(potential: &[f64], peak_voltage: f64, ratio: f64) -> ExclusionZone {
    let span = match (potential.first(), potential.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    ExclusionZone::around(peak_voltage, ratio * span)
}

/// Penalty strength scaled by `n²` so the relative smoothness is independent
/// of the sampling density.
pub fn effective_lambda(n: usize, lambda_factor: f64) -> f64 {
    lambda_factor * (n as f64).powi(2)
}

/// Weight 1 outside the zone, `floor` strictly inside it.
pub fn initial_weights(in_zone: &[bool], floor: f64) -> Vec<f64> {
    in_zone
        .iter()
        .map(|&inside| if inside { floor } else { 1.0 })
        .collect()
}

/// `‖new − old‖ / ‖old‖`.
pub fn relative_change(old: &[f64], new: &[f64]) -> f64 {
    let diff = old
        .iter()
        .zip(new)
        .map(|(a, b)| (b - a).powi(2))
        .sum::<f64>()
        .sqrt();
    let norm = old.iter().map(|a| a * a).sum::<f64>().sqrt();
    diff / norm.max(f64::MIN_POSITIVE)
}

// ---------------------------------------------------------------------------
// Reweighting
// ---------------------------------------------------------------------------

/// Sample standard deviation of the negative residuals, if at least two
/// exist and they are not all equal.
fn negative_residual_scale(residuals: &[f64]) -> Option<f64> {
    let negatives: Vec<f64> = residuals.iter().copied().filter(|r| *r < 0.0).collect();
    if negatives.len() < 2 {
        return None;
    }
    let mean = negatives.iter().sum::<f64>() / negatives.len() as f64;
    let var = negatives.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (negatives.len() - 1) as f64;
    let std = var.sqrt();
    (std > 0.0 && std.is_finite()).then_some(std)
}

/// Next weight vector from the residuals of the current fit.
///
/// Residuals near or below the negative-residual scale `σ` keep a weight
/// close to 1; residuals well above it (baseline under a peak) are driven
/// towards 0 by `1 / (1 + exp(k·(r − σ)/σ))`. Weights inside the exclusion
/// zone are capped at `floor` whatever the residual.
///
/// Returns `None` when no residual scale can be estimated.
pub fn reweight(
    residuals: &[f64],
    in_zone: &[bool],
    floor: f64,
    asymmetry: f64,
) -> Option<Vec<f64>> {
    let std = negative_residual_scale(residuals)?;
    Some(
        residuals
            .iter()
            .zip(in_zone)
            .map(|(r, &inside)| {
                let shifted = asymmetry * (r - std) / std;
                let w = (1.0 / (1.0 + shifted.exp())).clamp(MIN_WEIGHT, 1.0);
                if inside {
                    w.min(floor)
                } else {
                    w
                }
            })
            .collect(),
    )
}

/// Local penalty scale `|r| / max|r|`; all ones for a perfect fit.
fn penalty_scale(residuals: &[f64]) -> Vec<f64> {
    let peak = residuals.iter().fold(0.0_f64, |m, r| m.max(r.abs()));
    if peak > 0.0 {
        residuals.iter().map(|r| r.abs() / peak).collect()
    } else {
        vec![1.0; residuals.len()]
    }
}

// ---------------------------------------------------------------------------
// BaselineEstimator
// ---------------------------------------------------------------------------

/// Estimate a smooth baseline under `signal`, ignoring the region around
/// `peak_voltage`.
///
/// Each iteration solves the penalized least-squares system with the
/// current weights, then derives a fresh weight vector (and local penalty
/// scale) from the residuals. Stops on convergence, when no residual scale
/// is left, or after `max_iterations` fits.
pub fn estimate_baseline(
    signal: &[f64],
    potential: &[f64],
    peak_voltage: f64,
    config: &BaselineConfig,
) -> StageResult<BaselineFit> {
    let n = signal.len();
    if potential.len() != n {
        return Err(AnalysisError::MismatchedLengths {
            potential: potential.len(),
            signal: n,
        });
    }
    if n < 3 {
        return Err(AnalysisError::InsufficientData { got: n, min: 3 });
    }

    let zone = exclusion_zone(potential, peak_voltage, config.exclusion_width_ratio);
    let in_zone: Vec<bool> = potential.iter().map(|&p| zone.contains(p)).collect();
    let lambda = effective_lambda(n, config.lambda_factor);
    debug!(
        "baseline: n={n}, lambda={lambda:e}, zone=[{:.4}, {:.4}] ({} samples)",
        zone.lo,
        zone.hi,
        in_zone.iter().filter(|&&z| z).count()
    );

    let mut weights = initial_weights(&in_zone, config.exclusion_floor);
    let mut alpha: Option<Vec<f64>> = None;
    let mut iterations = 0;

    let (baseline, termination) = loop {
        iterations += 1;
        let baseline = solve_penalized(signal, &weights, alpha.as_deref(), lambda)?;
        let residuals: Vec<f64> = signal.iter().zip(&baseline).map(|(y, b)| y - b).collect();

        let Some(next) = reweight(&residuals, &in_zone, config.exclusion_floor, config.asymmetry)
        else {
            warn!("baseline: no negative residual scale after {iterations} fit(s), keeping current fit");
            break (baseline, Termination::NoNegativeResiduals);
        };

        let change = relative_change(&weights, &next);
        debug!("baseline: iteration {iterations}, weight change {change:.3e}");
        if change < config.tolerance {
            break (baseline, Termination::Converged);
        }
        if iterations >= config.max_iterations {
            warn!(
                "baseline: not converged after {iterations} iterations (change {change:.3e})"
            );
            break (baseline, Termination::IterationCap);
        }

        alpha = Some(penalty_scale(&residuals));
        weights = next;
    };

    Ok(BaselineFit {
        baseline,
        zone,
        weights,
        iterations,
        termination,
    })
}
