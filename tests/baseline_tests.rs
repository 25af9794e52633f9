//! Tests for the reweighted penalized baseline estimator.
//!
//! ## Test Organization
//!
//! 1. **Exclusion mask** - in-zone weights never exceed the floor
//! 2. **Drift tracking** - the baseline follows drift, not the peak
//! 3. **Loop control** - determinism and the hard iteration cap

use approx::assert_abs_diff_eq;

use swv_peak::processing::baseline::{
    estimate_baseline, exclusion_zone, initial_weights, reweight, Termination,
};
use swv_peak::processing::smoothing::smooth;
use swv_peak::synthetic::{SimpleRng, SyntheticScan};
use swv_peak::{AnalysisError, BaselineConfig, SmoothingConfig};

fn smoothed_scan(scan: &SyntheticScan) -> (Vec<f64>, Vec<f64>) {
    let potential = scan.potential();
    let smoothed = smooth(&scan.signal(), &SmoothingConfig::default()).unwrap();
    (potential, smoothed)
}

// ============================================================================
// Exclusion mask
// ============================================================================

/// Initial weights are the floor strictly inside the zone and 1 elsewhere.
#[test]
fn test_initial_weights_follow_the_zone() {
    let potential: Vec<f64> = (0..11).map(|i| i as f64 * 0.1).collect();
    let zone = exclusion_zone(&potential, 0.5, 0.15);
    let in_zone: Vec<bool> = potential.iter().map(|&p| zone.contains(p)).collect();
    let w = initial_weights(&in_zone, 1e-3);

    for (p, w) in potential.iter().zip(&w) {
        if (p - 0.5).abs() < 0.14 {
            assert_eq!(*w, 1e-3, "potential {p}");
        } else if (p - 0.5).abs() > 0.16 {
            assert_eq!(*w, 1.0, "potential {p}");
        }
    }
}

/// Whatever the residuals, reweighting never lifts an in-zone sample above
/// the floor and keeps every weight in (0, 1].
#[test]
fn test_reweight_never_lifts_excluded_samples() {
    let mut rng = SimpleRng::new(99);
    let floor = 1e-3;
    for round in 0..50 {
        let residuals: Vec<f64> = (0..80).map(|_| rng.gauss(0.0, 0.1 + round as f64)).collect();
        let in_zone: Vec<bool> = (0..80).map(|i| (30..45).contains(&i)).collect();

        let Some(weights) = reweight(&residuals, &in_zone, floor, 2.0) else {
            continue;
        };
        for (i, (&w, &inside)) in weights.iter().zip(&in_zone).enumerate() {
            assert!(w > 0.0 && w <= 1.0, "weight {w} at {i}");
            if inside {
                assert!(w <= floor, "in-zone weight {w} at {i}");
            }
        }
    }
}

/// The weights of the final fit respect the floor inside the realized zone.
#[test]
fn test_final_weights_respect_the_floor() {
    let (potential, smoothed) = smoothed_scan(&SyntheticScan::default());
    let cfg = BaselineConfig::default();
    let fit = estimate_baseline(&smoothed, &potential, 0.5, &cfg).unwrap();

    let mut inside = 0;
    for (p, w) in potential.iter().zip(&fit.weights) {
        if fit.zone.contains(*p) {
            inside += 1;
            assert!(*w <= cfg.exclusion_floor);
        }
    }
    assert!(inside > 0);
    assert_abs_diff_eq!(fit.zone.lo, 0.47, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.zone.hi, 0.53, epsilon = 1e-12);
}

// ============================================================================
// Drift tracking
// ============================================================================

/// With a strong linear drift the baseline sits on the drift, under the
/// peak as well as away from it.
#[test]
fn test_baseline_follows_linear_drift() {
    let scan = SyntheticScan {
        drift_offset: 0.2,
        drift_slope: 0.5,
        ..SyntheticScan::default()
    };
    let (potential, smoothed) = smoothed_scan(&scan);
    let fit = estimate_baseline(&smoothed, &potential, 0.5, &BaselineConfig::default()).unwrap();

    assert_eq!(fit.baseline.len(), potential.len());
    for (i, p) in potential.iter().enumerate().skip(10).take(81) {
        assert_abs_diff_eq!(fit.baseline[i], scan.drift_at(*p), epsilon = 0.03);
    }
}

// ============================================================================
// Loop control
// ============================================================================

/// Same input, same baseline, bit for bit.
#[test]
fn test_estimation_is_deterministic() {
    let (potential, smoothed) = smoothed_scan(&SyntheticScan::default());
    let cfg = BaselineConfig::default();
    let a = estimate_baseline(&smoothed, &potential, 0.5, &cfg).unwrap();
    let b = estimate_baseline(&smoothed, &potential, 0.5, &cfg).unwrap();
    assert_eq!(a, b);
}

/// The iteration cap is never exceeded.
#[test]
fn test_iteration_cap_is_hard() {
    let (potential, smoothed) = smoothed_scan(&SyntheticScan::default());
    for cap in 1..4 {
        let cfg = BaselineConfig {
            max_iterations: cap,
            tolerance: 1e-15,
            ..BaselineConfig::default()
        };
        let fit = estimate_baseline(&smoothed, &potential, 0.5, &cfg).unwrap();
        assert!(fit.iterations <= cap);
        if fit.termination == Termination::IterationCap {
            assert_eq!(fit.iterations, cap);
            assert!(!fit.converged());
        }
    }
}

/// Misaligned vectors are refused.
#[test]
fn test_mismatched_lengths() {
    let err = estimate_baseline(&[1.0; 10], &[0.0; 9], 0.5, &BaselineConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MismatchedLengths {
            potential: 9,
            signal: 10
        }
    );
}
