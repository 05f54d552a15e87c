// attitude_core/src/estimation/filters/scalar.rs

use crate::error::{EstimationError, Result};

/// A one-state, one-measurement Kalman filter on plain `f64`s.
///
/// Numerically it performs the exact same floating point operations, in the
/// same order, as `LinearKalmanFilter` configured with 1×1 matrices, so the two
/// can be used to cross-check each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarKalmanFilter {
    // --- Model ---
    f: f64,
    q: f64,
    h: f64,
    b: f64,
    r: f64,

    // --- Belief ---
    x: f64,
    p: f64,
    /// Gain from the last update, kept for diagnostics only.
    k: f64,
}

impl Default for ScalarKalmanFilter {
    fn default() -> Self {
        Self {
            f: 1.0,
            q: 0.0,
            h: 1.0,
            b: 0.0,
            r: 0.0,
            x: 0.0,
            p: 1.0,
            k: 0.0,
        }
    }
}

impl ScalarKalmanFilter {
    pub fn new(f: f64, q: f64, h: f64, b: f64, r: f64) -> Self {
        Self {
            f,
            q,
            h,
            b,
            r,
            ..Self::default()
        }
    }

    pub fn configure(&mut self, f: f64, q: f64, h: f64, b: f64) {
        self.f = f;
        self.q = q;
        self.h = h;
        self.b = b;
    }

    /// Sets the measurement noise used when `update` is not given one.
    pub fn set_measurement_noise(&mut self, r: f64) {
        self.r = r;
    }

    pub fn set_state(&mut self, x: f64) {
        self.x = x;
    }

    pub fn set_covariance(&mut self, p: f64) {
        self.p = p;
    }

    /// `x ← f·x + b·u`, `p ← f·p·f + q`
    pub fn predict(&mut self, u: f64) {
        self.x = self.f * self.x + self.b * u;
        self.p = self.f * self.p * self.f + self.q;
    }

    /// Fuses measurement `z`; `r` overrides the configured noise for this call.
    pub fn update(&mut self, z: f64, r: Option<f64>) -> Result<()> {
        let r = r.unwrap_or(self.r);

        let y = z - self.h * self.x;
        let s = self.h * self.p * self.h + r;
        if s == 0.0 || !s.is_finite() {
            return Err(EstimationError::Numerical(format!(
                "innovation variance is {s}"
            )));
        }

        // k = p·h/s, written as a multiplication by 1/s to match the matrix form P·Hᵀ·S⁻¹.
        let s_inv = 1.0 / s;
        let k = self.p * self.h * s_inv;

        self.k = k;
        self.x += k * y;
        self.p = (1.0 - k * self.h) * self.p;
        Ok(())
    }

    pub fn state(&self) -> f64 {
        self.x
    }

    pub fn gain(&self) -> f64 {
        self.k
    }

    pub fn covariance(&self) -> f64 {
        self.p
    }
}
