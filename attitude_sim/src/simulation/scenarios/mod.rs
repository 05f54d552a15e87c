// attitude_sim/src/simulation/scenarios/mod.rs

//! Synthetic sensor data generators.
//!
//! Each generator produces the whole run up front, with the ground truth kept
//! next to every noisy reading so the runner can score the estimator.

pub mod decay;
pub mod kinematic;
pub mod tank_steer;

use rand_distr::Normal;
use serde::Serialize;

use crate::simulation::core::error::{SimError, SimResult};

/// Longest run any generator will produce.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Fails unless `stddev` can describe a normal distribution.
pub fn check_stddev(name: &str, stddev: f64) -> SimResult<()> {
    if stddev.is_finite() && stddev >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidNoise(format!(
            "{name} must be finite and non-negative, got {stddev}"
        )))
    }
}

/// Fails unless a run of `count` samples is within `MAX_SAMPLES`.
pub fn check_sample_count(name: &str, count: f64) -> SimResult<()> {
    if count.is_finite() && (0.0..=MAX_SAMPLES as f64).contains(&count) {
        Ok(())
    } else {
        Err(SimError::Config(figment::Error::from(format!(
            "{name} asks for {count} samples, the limit is {MAX_SAMPLES}"
        ))))
    }
}

/// Zero-mean noise with the given standard deviation.
pub(crate) fn zero_mean(name: &str, stddev: f64) -> SimResult<Normal<f64>> {
    check_stddev(name, stddev)?;
    Ok(Normal::new(0.0, stddev)?)
}

/// One synthetic compass + gyro reading, with the truth it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSample {
    /// Seconds since the start of the run.
    pub time: f64,
    /// Compass reading, folded into the circular range, radians.
    pub heading: f64,
    /// Gyro reading, radians per second.
    pub angular_rate: f64,
    /// Real (continuous) heading of the vehicle, radians.
    pub true_heading: f64,
    /// Real yaw rate of the vehicle, radians per second.
    pub true_rate: f64,
}

/// One synthetic reading of the decaying process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecaySample {
    pub time: f64,
    /// The noiseless model value.
    pub ideal: f64,
    /// The real value, i.e. the model plus process wobble.
    pub actual: f64,
    pub measured: f64,
}

/// One synthetic reading of the position / velocity / acceleration process.
///
/// Every array is ordered `[position, velocity, acceleration]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KinematicSample {
    pub time: f64,
    pub ideal: [f64; 3],
    pub actual: [f64; 3],
    pub measured: [f64; 3],
}
