//! Deterministic synthetic voltammograms: one gaussian peak on a linear drift
//! plus seeded gaussian noise.

use serde::{Deserialize, Serialize};

/// `amplitude · exp(−(x − mu)² / 2σ²)`.
pub fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

// ---------------------------------------------------------------------------
// PRNG
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// SyntheticScan
// ---------------------------------------------------------------------------

/// Parameters of a synthetic square-wave voltammogram, in analysis convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticScan {
    pub points: usize,
    pub start: f64,
    pub end: f64,
    pub peak_center: f64,
    pub peak_sigma: f64,
    pub peak_amplitude: f64,
    pub drift_offset: f64,
    pub drift_slope: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticScan {
    fn default() -> Self {
        Self {
            points: 101,
            start: 0.0,
            end: 1.0,
            peak_center: 0.5,
            peak_sigma: 0.02,
            peak_amplitude: 1.0,
            drift_offset: 0.0,
            drift_slope: 0.02,
            noise: 0.01,
            seed: 42,
        }
    }
}

impl SyntheticScan {
    pub fn potential(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.points)
    }

    /// Drift component alone at `potential`.
    pub fn drift_at(&self, potential: f64) -> f64 {
        self.drift_offset + self.drift_slope * potential
    }

    /// Noise-free peak + drift.
    pub fn clean_signal(&self) -> Vec<f64> {
        self.potential()
            .iter()
            .map(|&p| {
                self.drift_at(p)
                    + gaussian(p, self.peak_center, self.peak_sigma, self.peak_amplitude)
            })
            .collect()
    }

    /// Peak + drift + seeded noise.
    pub fn signal(&self) -> Vec<f64> {
        let mut rng = SimpleRng::new(self.seed);
        self.clean_signal()
            .into_iter()
            .map(|v| v + rng.gauss(0.0, self.noise))
            .collect()
    }

    /// The scan as an instrument would export it: descending sweep, current
    /// in the instrument's (negative) sign convention.
    pub fn measurements(&self) -> Vec<(f64, f64)> {
        self.potential()
            .into_iter()
            .zip(self.signal())
            .rev()
            .map(|(p, s)| (p, -s))
            .collect()
    }
}
