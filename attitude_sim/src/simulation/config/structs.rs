// attitude_sim/src/simulation/config/structs.rs

use attitude_core::prelude::CompassConfig;
use serde::{Deserialize, Serialize};

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file.
/// Every section is optional; missing sections fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,

    #[serde(default)]
    pub noise: NoiseConfig,

    #[serde(default)]
    pub decay: DecayConfig,

    #[serde(default)]
    pub kinematic: KinematicConfig,

    #[serde(default = "tank_steer_compass")]
    pub compass: CompassConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            simulation: Simulation::default(),
            noise: NoiseConfig::default(),
            decay: DecayConfig::default(),
            kinematic: KinematicConfig::default(),
            compass: tank_steer_compass(),
        }
    }
}

/// Compass tuning that matches the default tank-steer noise levels.
///
/// The heading variance covers both the compass noise and the vehicle's own
/// wobble; the gyro is trusted far more than the derived rate.
pub fn tank_steer_compass() -> CompassConfig {
    let heading_var = (15f64.to_radians()).powi(2) + (5f64.to_radians()).powi(2);
    let gyro_var = (1f64.to_radians()).powi(2) + (5f64.to_radians()).powi(2);
    CompassConfig {
        process_noise: [[(5f64.to_radians()).powi(2), 0.0], [0.0, 0.25]],
        measurement_noise: [
            [heading_var, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, gyro_var],
        ],
        ..CompassConfig::default()
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")] // e.g., "tank_steer" in TOML maps to `TankSteer`
pub enum ScenarioKind {
    /// A skid-steer robot that pivots, drives straight and curves.
    #[default]
    TankSteer,
    /// A single exponentially decaying value.
    Decay,
    /// Position and velocity of a decaying motion, both measured.
    Speed,
    /// Position, velocity and acceleration, all three measured.
    Accel,
    /// Position, velocity and acceleration, with no acceleration sensor.
    UnmeasuredAccel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Seconds between consecutive samples.
    pub dt: f64,
    /// Which synthetic data generator to run.
    pub kind: ScenarioKind,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            dt: 0.1,
            kind: ScenarioKind::TankSteer,
        }
    }
}

/// Noise magnitudes for the tank-steer scenario, as standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseConfig {
    /// Compass noise, degrees.
    pub heading_stddev_deg: f64,
    /// Gyro noise, degrees per second.
    pub rate_stddev_deg_s: f64,
    /// Wobble of the vehicle's real heading around the ideal one while moving, degrees.
    pub yaw_process_stddev_deg: f64,
    /// Wobble of the vehicle's real yaw rate while moving, degrees per second.
    pub yaw_rate_process_stddev_deg_s: f64,
}

impl NoiseConfig {
    /// Every standard deviation in the section, with its key.
    pub fn stddevs(&self) -> [(&'static str, f64); 4] {
        [
            ("noise.heading_stddev_deg", self.heading_stddev_deg),
            ("noise.rate_stddev_deg_s", self.rate_stddev_deg_s),
            ("noise.yaw_process_stddev_deg", self.yaw_process_stddev_deg),
            ("noise.yaw_rate_process_stddev_deg_s", self.yaw_rate_process_stddev_deg_s),
        ]
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            heading_stddev_deg: 15.0,
            rate_stddev_deg_s: 1.0,
            yaw_process_stddev_deg: 5.0,
            yaw_rate_process_stddev_deg_s: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecayConfig {
    pub initial_value: f64,
    /// Per-sample multiplier of the ideal process.
    pub process_rate: f64,
    pub samples: usize,
    /// Wobble of the real value around the ideal one.
    pub process_stddev: f64,
    pub measurement_stddev: f64,
}

impl DecayConfig {
    pub fn stddevs(&self) -> [(&'static str, f64); 2] {
        [
            ("decay.process_stddev", self.process_stddev),
            ("decay.measurement_stddev", self.measurement_stddev),
        ]
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            initial_value: 100.0,
            process_rate: 0.999,
            samples: 1000,
            process_stddev: 0.5,
            measurement_stddev: 2.0,
        }
    }
}

/// Shared by the `speed`, `accel` and `unmeasured_accel` scenarios.
///
/// The ideal position decays by `process_rate` per sample; velocity and
/// acceleration are finite differences of the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KinematicConfig {
    pub initial_position: f64,
    /// Velocity reading of the first sample. The ideal process starts at rest.
    pub initial_velocity: f64,
    pub process_rate: f64,
    pub samples: usize,
    /// Wobble of the real position around the ideal one.
    pub process_stddev: f64,
    pub position_stddev: f64,
    pub velocity_stddev: f64,
    pub acceleration_stddev: f64,
}

impl KinematicConfig {
    pub fn stddevs(&self) -> [(&'static str, f64); 4] {
        [
            ("kinematic.process_stddev", self.process_stddev),
            ("kinematic.position_stddev", self.position_stddev),
            ("kinematic.velocity_stddev", self.velocity_stddev),
            ("kinematic.acceleration_stddev", self.acceleration_stddev),
        ]
    }
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            initial_position: 100.0,
            initial_velocity: -50.0,
            process_rate: 0.999,
            samples: 1000,
            process_stddev: 5.0,
            position_stddev: 2.0,
            velocity_stddev: 1e-3,
            acceleration_stddev: 1e-3,
        }
    }
}
