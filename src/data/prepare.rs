use super::model::SampleSeries;
use crate::error::{AnalysisError, StageResult};

// ---------------------------------------------------------------------------
// Raw measurement → SampleSeries
// ---------------------------------------------------------------------------

impl SampleSeries {
    /// Normalise raw `(potential, current)` pairs as read from an instrument export.
    ///
    /// * samples with a current of exactly zero are dropped (instrument padding)
    /// * the rest are sorted by ascending potential, keeping input order for ties
    /// * current is negated into the analysis convention
    ///
    /// Duplicate potentials are rejected since the slope filter of the peak
    /// search divides by potential spacing.
    pub fn from_measurements<I>(pairs: I) -> StageResult<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut kept: Vec<(f64, f64)> = Vec::new();
        for (i, (potential, current)) in pairs.into_iter().enumerate() {
            if !potential.is_finite() || !current.is_finite() {
                return Err(AnalysisError::InvalidInput(format!(
                    "measurement {i} is not finite ({potential}, {current})"
                )));
            }
            if current == 0.0 {
                continue;
            }
            kept.push((potential, current));
        }

        if kept.is_empty() {
            return Err(AnalysisError::InsufficientData { got: 0, min: 1 });
        }

        kept.sort_by(|a, b| a.0.total_cmp(&b.0));

        if let Some(w) = kept.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(AnalysisError::InvalidInput(format!(
                "duplicate potential {}",
                w[0].0
            )));
        }

        let (potential, signal): (Vec<f64>, Vec<f64>) =
            kept.into_iter().map(|(p, c)| (p, -c)).unzip();
        SampleSeries::new(potential, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_current_is_dropped_and_order_restored() {
        let raw = vec![(0.3, -3.0), (0.1, -1.0), (0.2, 0.0), (0.0, -0.5)];
        let series = SampleSeries::from_measurements(raw).unwrap();
        assert_eq!(series.potential(), &[0.0, 0.1, 0.3]);
        assert_eq!(series.signal(), &[0.5, 1.0, 3.0]);
        assert_eq!(series.span(), 0.3);
    }

    #[test]
    fn all_zero_current_is_insufficient() {
        let raw = vec![(0.0, 0.0), (0.1, 0.0)];
        let err = SampleSeries::from_measurements(raw).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { got: 0, min: 1 });
    }

    #[test]
    fn duplicate_potential_is_rejected() {
        let raw = vec![(0.1, -1.0), (0.2, -2.0), (0.1, -3.0)];
        let err = SampleSeries::from_measurements(raw).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn infinite_current_is_rejected() {
        let raw = vec![(0.1, f64::INFINITY)];
        assert!(SampleSeries::from_measurements(raw).is_err());
    }
}
