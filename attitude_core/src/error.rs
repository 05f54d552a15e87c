// attitude_core/src/error.rs

use thiserror::Error;

/// Everything that can go wrong inside an estimator.
///
/// None of these are recovered from internally. The caller decides whether the
/// tracking session is over or whether to reset state and noise explicitly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// Matrix/vector dimensions do not agree, or a required matrix is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The innovation covariance could not be inverted, or the covariance
    /// matrix stopped being finite and symmetric.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// The operation is not valid in the filter's current lifecycle state.
    #[error("state error: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, EstimationError>;
