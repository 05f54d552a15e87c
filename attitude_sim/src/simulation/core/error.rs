// attitude_sim/src/simulation/core/error.rs

use attitude_core::error::EstimationError;
use thiserror::Error;

/// Everything that can stop a scenario run.
#[derive(Error, Debug)]
pub enum SimError {
    /// The scenario file could not be read, parsed or validated.
    #[error("scenario configuration error: {0}")]
    Config(#[from] figment::Error),

    /// The estimator rejected its configuration or a sample.
    #[error("estimation failed: {0}")]
    Estimation(#[from] EstimationError),

    /// A noise magnitude that cannot parameterize a normal distribution.
    #[error("invalid noise parameter: {0}")]
    InvalidNoise(String),
}

impl From<rand_distr::NormalError> for SimError {
    fn from(e: rand_distr::NormalError) -> Self {
        SimError::InvalidNoise(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
