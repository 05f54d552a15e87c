// attitude_sim/src/simulation/scenarios/tank_steer.rs

use attitude_core::prelude::fold_angle;
use rand_distr::Distribution;
use std::f64::consts::PI;

use super::{check_sample_count, zero_mean, SensorSample};
use crate::simulation::config::NoiseConfig;
use crate::simulation::core::{error::SimResult, prng::SimulationRng};

/// Yaw rate at full opposite wheel speeds, radians per second.
pub const MAX_PIVOT_RATE: f64 = PI;

/// Total length of the drive, seconds.
pub const DURATION: f64 = 7.0;

/// What the robot is doing at a given moment of the drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivePhase {
    Still,
    PivotRight,
    Straight,
    CurveLeft,
}

impl DrivePhase {
    /// Sit still 1 s, pivot right 2 s, straight 2 s, then curve left.
    pub fn at(time: f64) -> Self {
        if time < 1.0 {
            DrivePhase::Still
        } else if time < 3.0 {
            DrivePhase::PivotRight
        } else if time < 5.0 {
            DrivePhase::Straight
        } else {
            DrivePhase::CurveLeft
        }
    }

    /// Normalized (left, right) wheel speeds.
    pub fn wheel_speeds(self) -> (f64, f64) {
        match self {
            DrivePhase::Still => (0.0, 0.0),
            DrivePhase::PivotRight => (1.0, -1.0),
            DrivePhase::Straight => (1.0, 1.0),
            DrivePhase::CurveLeft => (0.0, 1.0),
        }
    }

    pub fn yaw_rate(self) -> f64 {
        let (left, right) = self.wheel_speeds();
        MAX_PIVOT_RATE * (left - right) / 2.0
    }
}

/// Number of samples in a drive sampled every `dt` seconds.
pub fn sample_count(dt: f64) -> SimResult<usize> {
    let count = (DURATION / dt).round();
    check_sample_count("tank-steer drive", count)?;
    Ok(count as usize)
}

/// Generates the skid-steer drive sampled every `dt` seconds.
///
/// The vehicle's real heading and rate wobble around the ideal ones only while
/// it is moving. Sensor noise is always present.
pub fn generate(dt: f64, noise: &NoiseConfig, rng: &mut SimulationRng) -> SimResult<Vec<SensorSample>> {
    let yaw_wobble = zero_mean("yaw_process_stddev_deg", noise.yaw_process_stddev_deg.to_radians())?;
    let rate_wobble = zero_mean(
        "yaw_rate_process_stddev_deg_s",
        noise.yaw_rate_process_stddev_deg_s.to_radians(),
    )?;
    let compass_noise = zero_mean("heading_stddev_deg", noise.heading_stddev_deg.to_radians())?;
    let gyro_noise = zero_mean("rate_stddev_deg_s", noise.rate_stddev_deg_s.to_radians())?;

    let count = sample_count(dt)?;
    let mut samples = Vec::with_capacity(count);
    let mut yaw_ideal = 0.0;

    for i in 0..count {
        let time = i as f64 * dt;
        let phase = DrivePhase::at(time);
        let rate_ideal = phase.yaw_rate();
        if i > 0 {
            yaw_ideal += rate_ideal * dt;
        }

        let (mut yaw, mut rate) = (yaw_ideal, rate_ideal);
        if phase != DrivePhase::Still {
            yaw += yaw_wobble.sample(&mut rng.0);
            rate += rate_wobble.sample(&mut rng.0);
        }

        samples.push(SensorSample {
            time,
            heading: fold_angle(yaw + compass_noise.sample(&mut rng.0)),
            angular_rate: rate + gyro_noise.sample(&mut rng.0),
            true_heading: yaw,
            true_rate: rate,
        });
    }
    Ok(samples)
}
