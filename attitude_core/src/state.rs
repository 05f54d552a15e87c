// attitude_core/src/state.rs

use nalgebra::DMatrix;

use crate::types::State;

/// A Gaussian belief: the state vector `x` together with its covariance `P`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianState {
    /// The actual numerical data vector `x`.
    pub vector: State,
    /// The covariance matrix `P`.
    pub covariance: DMatrix<f64>,
}

impl GaussianState {
    pub fn new(vector: State, covariance: DMatrix<f64>) -> Self {
        Self { vector, covariance }
    }

    /// Returns the dimension (number of rows) of the state vector.
    pub fn dim(&self) -> usize {
        self.vector.nrows()
    }

    /// True if every entry of `x` and `P` is finite.
    pub fn is_finite(&self) -> bool {
        self.vector.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
    }
}

/// Checks that a square matrix is symmetric up to a relative tolerance.
/// `|a_ij - a_ji| <= tolerance * max(1, |a_ij|, |a_ji|)`
pub fn is_symmetric(m: &DMatrix<f64>, tolerance: f64) -> bool {
    if !m.is_square() {
        return false;
    }
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let a = m[(i, j)];
            let b = m[(j, i)];
            let scale = 1.0_f64.max(a.abs()).max(b.abs());
            if (a - b).abs() > tolerance * scale {
                return false;
            }
        }
    }
    true
}
