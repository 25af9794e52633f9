use log::{debug, warn};
use serde::Serialize;

use crate::config::PeakSearchConfig;
use crate::data::model::Peak;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// How a peak index was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    /// Plain maximum of the search region.
    Unconstrained,
    /// Maximum among samples passing the slope ceiling.
    SlopeConstrained,
    /// No sample passed the slope ceiling; the first sample of the search
    /// region was returned instead.
    Fallback,
}

/// A located peak together with its index and provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakLocation {
    pub index: usize,
    pub peak: Peak,
    pub detection: Detection,
}

impl PeakLocation {
    /// True when the location is the margin-boundary fallback rather than a
    /// genuine detection.
    pub fn is_low_confidence(&self) -> bool {
        self.detection == Detection::Fallback
    }
}

// ---------------------------------------------------------------------------
// Search region & derivative
// ---------------------------------------------------------------------------

/// Half-open index range `[margin, n − margin)` searched for a peak.
pub fn search_region(n: usize, margin_ratio: f64) -> (usize, usize) {
    let margin = (n as f64 * margin_ratio).floor() as usize;
    (margin, n.saturating_sub(margin))
}

/// Derivative of `values` with respect to `positions`.
///
/// Second-order central differences on the interior (valid for uneven
/// spacing), one-sided first-order differences at the two ends. A single
/// sample has zero slope.
pub fn gradient(values: &[f64], positions: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (positions[1] - positions[0]));
    for i in 1..n - 1 {
        let hs = positions[i] - positions[i - 1];
        let hd = positions[i + 1] - positions[i];
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i]
            - hd * hd * values[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }
    out.push((values[n - 1] - values[n - 2]) / (positions[n - 1] - positions[n - 2]));
    out
}

/// Index of the largest value among `candidates`, lowest index on ties.
fn argmax<I>(signal: &[f64], candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    candidates.into_iter().fold(None, |best, i| match best {
        Some(b) if signal[i] <= signal[b] => Some(b),
        _ => Some(i),
    })
}

// ---------------------------------------------------------------------------
// PeakLocator
// ---------------------------------------------------------------------------

/// Locate the signal maximum inside the trimmed search region.
///
/// With a slope ceiling, only samples whose local derivative magnitude is
/// strictly below it compete; if none qualify the first sample of the region
/// is returned and flagged [`Detection::Fallback`].
///
/// The caller guarantees equal lengths and a non-empty region
/// (`margin < n − margin`).
pub fn locate_peak(signal: &[f64], potential: &[f64], config: &PeakSearchConfig) -> PeakLocation {
    let (lo, hi) = search_region(signal.len(), config.margin_ratio);
    debug_assert!(lo < hi, "empty peak search region");

    let at = |index: usize, detection: Detection| PeakLocation {
        index,
        peak: Peak {
            voltage: potential[index],
            current: signal[index],
        },
        detection,
    };

    let Some(max_slope) = config.max_slope else {
        let index = argmax(signal, lo..hi).unwrap_or(lo);
        return at(index, Detection::Unconstrained);
    };

    let slopes = gradient(&signal[lo..hi], &potential[lo..hi]);
    let eligible = slopes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.abs() < max_slope)
        .map(|(i, _)| lo + i);

    match argmax(signal, eligible) {
        Some(index) => {
            debug!("peak at index {index} (region {lo}..{hi})");
            at(index, Detection::SlopeConstrained)
        }
        None => {
            warn!("no sample in {lo}..{hi} below slope {max_slope}, using region start");
            at(lo, Detection::Fallback)
        }
    }
}
