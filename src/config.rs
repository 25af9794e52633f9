use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, StageResult};

// ---------------------------------------------------------------------------
// Policy defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_WINDOW_LENGTH: usize = 11;
pub const DEFAULT_POLY_ORDER: usize = 2;
pub const DEFAULT_MARGIN_RATIO: f64 = 0.10;
pub const DEFAULT_MAX_SLOPE: f64 = 500.0;
pub const DEFAULT_EXCLUSION_WIDTH_RATIO: f64 = 0.03;
pub const DEFAULT_LAMBDA_FACTOR: f64 = 1e3;
pub const DEFAULT_TOLERANCE: f64 = 1e-2;
pub const DEFAULT_MAX_ITERATIONS: usize = 25;
pub const DEFAULT_EXCLUSION_FLOOR: f64 = 1e-3;
pub const DEFAULT_ASYMMETRY: f64 = 0.5;

// ---------------------------------------------------------------------------
// Per-stage configuration
// ---------------------------------------------------------------------------

/// Savitzky–Golay smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Preferred window length; shrunk to fit short signals.
    pub window_length: usize,
    pub poly_order: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_WINDOW_LENGTH,
            poly_order: DEFAULT_POLY_ORDER,
        }
    }
}

/// Peak search parameters, shared by the approximate and final searches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakSearchConfig {
    /// Fraction of samples ignored at each end of the scan.
    pub margin_ratio: f64,
    /// Only samples with `|d signal / d potential|` strictly below this are
    /// eligible. `None` disables the slope filter.
    pub max_slope: Option<f64>,
}

impl Default for PeakSearchConfig {
    fn default() -> Self {
        Self {
            margin_ratio: DEFAULT_MARGIN_RATIO,
            max_slope: Some(DEFAULT_MAX_SLOPE),
        }
    }
}

/// Iteratively reweighted penalized least-squares parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Half-width of the exclusion zone, as a fraction of the potential span.
    pub exclusion_width_ratio: f64,
    /// Penalty strength before scaling by `n²`.
    pub lambda_factor: f64,
    /// Relative weight change below which the fit is considered converged.
    pub tolerance: f64,
    /// Hard cap on the number of fits.
    pub max_iterations: usize,
    /// Weight given to samples inside the exclusion zone; never exceeded.
    pub exclusion_floor: f64,
    /// Steepness of the logistic weighting around the negative-residual scale.
    pub asymmetry: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            exclusion_width_ratio: DEFAULT_EXCLUSION_WIDTH_RATIO,
            lambda_factor: DEFAULT_LAMBDA_FACTOR,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            exclusion_floor: DEFAULT_EXCLUSION_FLOOR,
            asymmetry: DEFAULT_ASYMMETRY,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// All tunables of one pipeline run.
///
/// Partial JSON overrides are accepted, missing fields keep their defaults:
///
/// ```
/// let cfg: swv_peak::PipelineConfig =
///     serde_json::from_str(r#"{ "baseline": { "lambda_factor": 50.0 } }"#).unwrap();
/// assert_eq!(cfg.baseline.lambda_factor, 50.0);
/// assert_eq!(cfg.peak_search.margin_ratio, 0.10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub smoothing: SmoothingConfig,
    pub peak_search: PeakSearchConfig,
    pub baseline: BaselineConfig,
}

impl PipelineConfig {
    /// Reject parameter combinations no stage can work with.
    pub fn validate(&self) -> StageResult<()> {
        let s = &self.smoothing;
        if s.window_length < 3 || s.window_length % 2 == 0 {
            return invalid(format!(
                "window length must be odd and >= 3, got {}",
                s.window_length
            ));
        }
        if s.poly_order >= s.window_length {
            return invalid(format!(
                "polynomial order {} must be below window length {}",
                s.poly_order, s.window_length
            ));
        }

        let p = &self.peak_search;
        if !(0.0..0.5).contains(&p.margin_ratio) {
            return invalid(format!(
                "margin ratio must lie in [0, 0.5), got {}",
                p.margin_ratio
            ));
        }
        if let Some(slope) = p.max_slope {
            if !slope.is_finite() || slope <= 0.0 {
                return invalid(format!("slope ceiling must be positive, got {slope}"));
            }
        }

        let b = &self.baseline;
        if !b.exclusion_width_ratio.is_finite() || b.exclusion_width_ratio < 0.0 {
            return invalid(format!(
                "exclusion width ratio must be non-negative, got {}",
                b.exclusion_width_ratio
            ));
        }
        if !b.lambda_factor.is_finite() || b.lambda_factor <= 0.0 {
            return invalid(format!(
                "lambda factor must be positive, got {}",
                b.lambda_factor
            ));
        }
        if !b.tolerance.is_finite() || b.tolerance <= 0.0 {
            return invalid(format!("tolerance must be positive, got {}", b.tolerance));
        }
        if b.max_iterations == 0 {
            return invalid("max iterations must be at least 1".to_string());
        }
        if !(b.exclusion_floor > 0.0 && b.exclusion_floor <= 1.0) {
            return invalid(format!(
                "exclusion floor must lie in (0, 1], got {}",
                b.exclusion_floor
            ));
        }
        if !b.asymmetry.is_finite() || b.asymmetry <= 0.0 {
            return invalid(format!("asymmetry must be positive, got {}", b.asymmetry));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> StageResult<()> {
    Err(AnalysisError::InvalidConfig(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn even_window_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.smoothing.window_length = 10;
        assert!(matches!(
            cfg.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn half_margin_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.peak_search.margin_ratio = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_slope_ceiling_is_rejected_but_none_is_fine() {
        let mut cfg = PipelineConfig::default();
        cfg.peak_search.max_slope = Some(0.0);
        assert!(cfg.validate().is_err());
        cfg.peak_search.max_slope = None;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn floor_above_one_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.baseline.exclusion_floor = 1.5;
        assert!(cfg.validate().is_err());
    }
}
