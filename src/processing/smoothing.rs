use log::debug;

use crate::config::SmoothingConfig;
use crate::error::{AnalysisError, StageResult};

/// Fewest samples the smoother accepts.
pub const MIN_SAMPLES: usize = 5;

// ---------------------------------------------------------------------------
// Window selection
// ---------------------------------------------------------------------------

/// Largest odd window `<= n` not exceeding `preferred`, never below 3.
pub fn window_length_for(n: usize, preferred: usize) -> usize {
    let largest_odd = if n % 2 == 1 { n } else { n.saturating_sub(1) };
    preferred.min(largest_odd).max(3)
}

// ---------------------------------------------------------------------------
// Savitzky–Golay coefficients
// ---------------------------------------------------------------------------

/// Convolution weights of a least-squares polynomial fit over `window`
/// equally spaced samples, evaluated at `offset` from the window centre.
///
/// `offset = 0` gives the classic symmetric smoothing kernel; non-zero
/// offsets are used for the samples within half a window of either edge.
pub fn savgol_coefficients(window: usize, order: usize, offset: f64) -> StageResult<Vec<f64>> {
    if order >= window {
        return Err(AnalysisError::InvalidConfig(format!(
            "polynomial order {order} must be below window length {window}"
        )));
    }
    let half = (window as f64 - 1.0) / 2.0;
    let offsets: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();
    let terms = order + 1;

    // Normal matrix AᵀA of the Vandermonde design: entry (i, k) = Σ o^(i+k).
    let moments: Vec<f64> = (0..2 * terms - 1)
        .map(|p| offsets.iter().map(|o| o.powi(p as i32)).sum())
        .collect();
    let mut normal: Vec<Vec<f64>> = (0..terms)
        .map(|i| (0..terms).map(|k| moments[i + k]).collect())
        .collect();
    let mut rhs: Vec<f64> = (0..terms).map(|k| offset.powi(k as i32)).collect();

    let z = solve_dense(&mut normal, &mut rhs)?;
    Ok(offsets
        .iter()
        .map(|o| {
            z.iter()
                .enumerate()
                .map(|(k, zk)| zk * o.powi(k as i32))
                .sum()
        })
        .collect())
}

/// Gaussian elimination with partial pivoting on a small dense system.
fn solve_dense(a: &mut [Vec<f64>], b: &mut [f64]) -> StageResult<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(AnalysisError::NumericalInstability(
                "singular smoothing design matrix".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        let pivot_row = a[col].clone();
        let pivot_rhs = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            for k in col..n {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_rhs;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

// ---------------------------------------------------------------------------
// Smoother
// ---------------------------------------------------------------------------

/// Savitzky–Golay smoothing with polynomial edge fitting.
///
/// Interior samples use the centred kernel. The first and last half-window
/// samples are taken from one polynomial fitted to the first (resp. last)
/// full window, so the output always has the input's length.
pub fn smooth(signal: &[f64], config: &SmoothingConfig) -> StageResult<Vec<f64>> {
    let n = signal.len();
    if n < MIN_SAMPLES {
        return Err(AnalysisError::InsufficientData {
            got: n,
            min: MIN_SAMPLES,
        });
    }

    if config.window_length < 3 || config.window_length % 2 == 0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "window length must be odd and >= 3, got {}",
            config.window_length
        )));
    }

    let window = window_length_for(n, config.window_length);
    let half = window / 2;
    debug!("smoothing {n} samples, window {window}, order {}", config.poly_order);

    let kernel = savgol_coefficients(window, config.poly_order, 0.0)?;
    let mut smoothed: Vec<f64> = signal
        .windows(window)
        .map(|w| dot(&kernel, w))
        .collect();

    let head = &signal[..window];
    let tail = &signal[n - window..];
    let mut left = Vec::with_capacity(half);
    let mut right = Vec::with_capacity(half);
    for i in 0..half {
        let offset = half as f64 - i as f64;
        left.push(dot(&savgol_coefficients(window, config.poly_order, -offset)?, head));
        right.push(dot(&savgol_coefficients(window, config.poly_order, offset)?, tail));
    }
    right.reverse();

    left.append(&mut smoothed);
    left.append(&mut right);
    Ok(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn window_policy() {
        assert_eq!(window_length_for(101, 11), 11);
        assert_eq!(window_length_for(11, 11), 11);
        assert_eq!(window_length_for(10, 11), 9);
        assert_eq!(window_length_for(5, 11), 5);
        assert_eq!(window_length_for(6, 11), 5);
        assert_eq!(window_length_for(2, 11), 3);
    }

    #[test]
    fn five_point_quadratic_kernel_matches_tabulated_values() {
        let c = savgol_coefficients(5, 2, 0.0).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|v| v / 35.0);
        for (got, want) in c.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn coefficients_sum_to_one_at_any_offset() {
        for offset in [-5.0, -2.0, 0.0, 3.0, 5.0] {
            let c = savgol_coefficients(11, 2, offset).unwrap();
            assert_abs_diff_eq!(c.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn quadratic_is_reproduced_everywhere_including_edges() {
        let y: Vec<f64> = (0..30)
            .map(|i| {
                let x = i as f64;
                0.5 * x * x - 3.0 * x + 2.0
            })
            .collect();
        let s = smooth(&y, &SmoothingConfig::default()).unwrap();
        assert_eq!(s.len(), y.len());
        for (a, b) in s.iter().zip(&y) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-8);
        }
    }

    #[test]
    fn order_not_below_window_is_rejected() {
        assert!(matches!(
            savgol_coefficients(3, 3, 0.0),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
