//! Tests for the Savitzky–Golay smoother.
//!
//! ## Test Organization
//!
//! 1. **Window policy** - clamping for short signals
//! 2. **Linearity** - the smoother is a linear operator
//! 3. **Errors** - too few samples

use approx::assert_abs_diff_eq;

use swv_peak::processing::smoothing::{smooth, window_length_for, MIN_SAMPLES};
use swv_peak::synthetic::SimpleRng;
use swv_peak::{AnalysisError, SmoothingConfig};

fn noisy_sine(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = SimpleRng::new(seed);
    (0..n)
        .map(|i| (i as f64 * 0.05).sin() + rng.gauss(0.0, 1.0))
        .collect()
}

// ============================================================================
// Window policy
// ============================================================================

/// A 101-sample noisy sine keeps the preferred window and its length.
#[test]
fn test_noisy_sine_keeps_length_and_window() {
    let signal = noisy_sine(101, 3);
    assert_eq!(window_length_for(signal.len(), 11), 11);

    let smoothed = smooth(&signal, &SmoothingConfig::default()).unwrap();
    assert_eq!(smoothed.len(), 101);
    assert!(smoothed.iter().all(|v| v.is_finite()));
}

/// Smoothing reduces sample-to-sample variation of white noise.
#[test]
fn test_noise_is_suppressed() {
    let signal = noisy_sine(101, 11);
    let smoothed = smooth(&signal, &SmoothingConfig::default()).unwrap();

    let roughness = |v: &[f64]| v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<f64>();
    assert!(roughness(&smoothed) < 0.5 * roughness(&signal));
}

/// Every admissible length is preserved, including those that shrink the window.
#[test]
fn test_length_is_preserved_for_short_signals() {
    for n in MIN_SAMPLES..40 {
        let signal = noisy_sine(n, n as u64);
        let window = window_length_for(n, 11);
        assert!(window % 2 == 1 && window >= 3 && window <= n);
        assert_eq!(smooth(&signal, &SmoothingConfig::default()).unwrap().len(), n);
    }
}

// ============================================================================
// Linearity
// ============================================================================

/// `smooth(a·x + b·y) == a·smooth(x) + b·smooth(y)`.
#[test]
fn test_smoothing_is_linear() {
    let cfg = SmoothingConfig::default();
    let (a, b) = (2.5, -0.75);
    for n in [5, 8, 23, 101] {
        let x = noisy_sine(n, 1);
        let y = noisy_sine(n, 2);
        let combo: Vec<f64> = x.iter().zip(&y).map(|(x, y)| a * x + b * y).collect();

        let sx = smooth(&x, &cfg).unwrap();
        let sy = smooth(&y, &cfg).unwrap();
        let sc = smooth(&combo, &cfg).unwrap();
        for i in 0..n {
            assert_abs_diff_eq!(sc[i], a * sx[i] + b * sy[i], epsilon = 1e-9);
        }
    }
}

/// Identical input gives bit-identical output.
#[test]
fn test_smoothing_is_deterministic() {
    let signal = noisy_sine(64, 9);
    let cfg = SmoothingConfig::default();
    assert_eq!(smooth(&signal, &cfg).unwrap(), smooth(&signal, &cfg).unwrap());
}

// ============================================================================
// Errors
// ============================================================================

/// Four samples are not enough.
#[test]
fn test_four_samples_are_rejected() {
    let err = smooth(&[1.0, 2.0, 3.0, 4.0], &SmoothingConfig::default()).unwrap_err();
    assert_eq!(err, AnalysisError::InsufficientData { got: 4, min: 5 });
}
