//! Weighted penalized least squares with a second-difference roughness penalty.
//!
//! Solves for `b` minimising
//!
//! ```text
//! Σ wᵢ (yᵢ − bᵢ)²  +  λ ‖D b‖²
//! ```
//!
//! optionally with the penalty rescaled per sample by `αᵢ`, i.e. the linear
//! system `(W + λ·diag(α)·DᵀD) b = W y`, where `D` is the
//! `(n−2)×n` second-difference operator. Dividing row `i` by `αᵢ` gives the
//! symmetric positive definite system `(diag(w/α) + λ·DᵀD) b = diag(w/α) y`,
//! which is pentadiagonal and factorised here by a banded Cholesky in `O(n)`.

use crate::error::{AnalysisError, StageResult};

/// Lower bound applied to the local penalty scale before dividing by it.
pub const MIN_PENALTY_SCALE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Symmetric pentadiagonal matrix
// ---------------------------------------------------------------------------

/// Lower half of a symmetric matrix with bandwidth 2.
///
/// `sub1[i]` holds entry `(i, i−1)` and `sub2[i]` entry `(i, i−2)`; the
/// leading slots of both are unused.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricBanded {
    pub diag: Vec<f64>,
    pub sub1: Vec<f64>,
    pub sub2: Vec<f64>,
}

impl SymmetricBanded {
    /// `λ·DᵀD` for `n` samples.
    pub fn second_difference_penalty(n: usize, lambda: f64) -> Self {
        let mut m = Self {
            diag: vec![0.0; n],
            sub1: vec![0.0; n],
            sub2: vec![0.0; n],
        };
        const STENCIL: [f64; 3] = [1.0, -2.0, 1.0];
        for row in 0..n.saturating_sub(2) {
            for p in 0..3 {
                for q in 0..=p {
                    let v = lambda * STENCIL[p] * STENCIL[q];
                    match p - q {
                        0 => m.diag[row + p] += v,
                        1 => m.sub1[row + p] += v,
                        _ => m.sub2[row + p] += v,
                    }
                }
            }
        }
        m
    }

    pub fn len(&self) -> usize {
        self.diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    /// Factorise as `L·Lᵀ`; fails when the matrix is not positive definite.
    pub fn cholesky(&self) -> StageResult<BandedCholesky> {
        let n = self.len();
        let mut l0 = vec![0.0; n];
        let mut l1 = vec![0.0; n];
        let mut l2 = vec![0.0; n];

        for i in 0..n {
            if i >= 2 {
                l2[i] = self.sub2[i] / l0[i - 2];
            }
            if i >= 1 {
                let carry = if i >= 2 { l2[i] * l1[i - 1] } else { 0.0 };
                l1[i] = (self.sub1[i] - carry) / l0[i - 1];
            }
            let pivot = self.diag[i] - l1[i] * l1[i] - l2[i] * l2[i];
            if !pivot.is_finite() || pivot <= f64::EPSILON * self.diag[i].abs() {
                return Err(AnalysisError::NumericalInstability(format!(
                    "penalized system is not positive definite at row {i} (pivot {pivot:e})"
                )));
            }
            l0[i] = pivot.sqrt();
        }
        Ok(BandedCholesky { l0, l1, l2 })
    }
}

/// Banded Cholesky factor of a [`SymmetricBanded`] matrix.
#[derive(Debug, Clone)]
pub struct BandedCholesky {
    l0: Vec<f64>,
    l1: Vec<f64>,
    l2: Vec<f64>,
}

impl BandedCholesky {
    /// Solve `L·Lᵀ x = rhs` by forward then backward substitution.
    pub fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        let n = self.l0.len();
        let mut z = vec![0.0; n];
        for i in 0..n {
            let mut s = rhs[i];
            if i >= 1 {
                s -= self.l1[i] * z[i - 1];
            }
            if i >= 2 {
                s -= self.l2[i] * z[i - 2];
            }
            z[i] = s / self.l0[i];
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut s = z[i];
            if i + 1 < n {
                s -= self.l1[i + 1] * x[i + 1];
            }
            if i + 2 < n {
                s -= self.l2[i + 2] * x[i + 2];
            }
            x[i] = s / self.l0[i];
        }
        x
    }
}

// ---------------------------------------------------------------------------
// Penalized fit
// ---------------------------------------------------------------------------

/// Fit a smooth curve to `signal` given per-sample `weights`, an optional
/// per-sample penalty scale `alpha` (all ones when `None`) and penalty
/// strength `lambda`.
pub fn solve_penalized(
    signal: &[f64],
    weights: &[f64],
    alpha: Option<&[f64]>,
    lambda: f64,
) -> StageResult<Vec<f64>> {
    let n = signal.len();
    if weights.len() != n || alpha.is_some_and(|a| a.len() != n) {
        return Err(AnalysisError::Unexpected(format!(
            "penalized fit received misaligned vectors (signal {n}, weights {})",
            weights.len()
        )));
    }

    let mut system = SymmetricBanded::second_difference_penalty(n, lambda);
    let fidelity: Vec<f64> = match alpha {
        Some(alpha) => weights
            .iter()
            .zip(alpha)
            .map(|(w, a)| w / a.max(MIN_PENALTY_SCALE))
            .collect(),
        None => weights.to_vec(),
    };
    for (d, f) in system.diag.iter_mut().zip(&fidelity) {
        *d += f;
    }

    let rhs: Vec<f64> = fidelity.iter().zip(signal).map(|(f, y)| f * y).collect();
    let baseline = system.cholesky()?.solve(&rhs);

    if let Some(i) = baseline.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::NumericalInstability(format!(
            "penalized fit produced a non-finite value at index {i}"
        )));
    }
    Ok(baseline)
}
