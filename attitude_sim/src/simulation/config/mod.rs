// attitude_sim/src/simulation/config/mod.rs

//! This module handles loading and validating scenario configuration, either
//! from a TOML file on disk or from the built-in defaults.

pub mod structs;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::simulation::core::error::{SimError, SimResult};
use crate::simulation::scenarios::{check_sample_count, check_stddev, tank_steer};
pub use structs::{
    DecayConfig, KinematicConfig, NoiseConfig, ScenarioConfig, ScenarioKind, Simulation,
};

/// Layers the scenario file over the defaults, then the CLI seed over both.
pub fn load_scenario(path: Option<&Path>, seed_override: Option<u64>) -> SimResult<ScenarioConfig> {
    let mut figment = Figment::from(Serialized::defaults(ScenarioConfig::default()));

    match path {
        Some(path) => {
            info!("Loading scenario from: {}", path.display());
            if !path.is_file() {
                return Err(SimError::Config(figment::Error::from(format!(
                    "scenario file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file_exact(path));
        }
        None => info!("No scenario file given, running the built-in tank-steer scenario"),
    }
    if let Some(seed) = seed_override {
        figment = figment.merge(Serialized::default("simulation.seed", seed));
    }

    finish(figment)
}

/// Parses a scenario from an in-memory TOML document, over the defaults.
pub fn scenario_from_str(toml: &str) -> SimResult<ScenarioConfig> {
    finish(Figment::from(Serialized::defaults(ScenarioConfig::default())).merge(Toml::string(toml)))
}

fn finish(figment: Figment) -> SimResult<ScenarioConfig> {
    let config: ScenarioConfig = figment.extract()?;
    validate(&config)?;

    match toml::to_string(&config) {
        Ok(resolved) => debug!("Resolved scenario:\n{}", resolved),
        Err(e) => warn!("Could not render resolved scenario for logging: {}", e),
    }
    Ok(config)
}

fn validate(config: &ScenarioConfig) -> SimResult<()> {
    let dt = config.simulation.dt;
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SimError::Config(figment::Error::from(format!(
            "simulation.dt must be positive, got {dt}"
        ))));
    }
    tank_steer::sample_count(dt)?;
    for (name, samples) in [
        ("decay.samples", config.decay.samples),
        ("kinematic.samples", config.kinematic.samples),
    ] {
        if samples == 0 {
            return Err(SimError::Config(figment::Error::from(format!(
                "{name} must be at least 1"
            ))));
        }
        check_sample_count(name, samples as f64)?;
    }

    let noise = config.noise.stddevs();
    let decay = config.decay.stddevs();
    let kinematic = config.kinematic.stddevs();
    for (name, stddev) in noise.iter().chain(&decay).chain(&kinematic) {
        check_stddev(name, *stddev)?;
    }

    config.compass.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = scenario_from_str("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = scenario_from_str(
            r#"
            [simulation]
            seed = 7
            kind = "decay"

            [compass]
            rate_coupling = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.kind, ScenarioKind::Decay);
        assert_abs_diff_eq!(config.simulation.dt, 0.1);
        assert_abs_diff_eq!(config.compass.rate_coupling, 0.5);
        assert_eq!(
            config.compass.measurement_noise,
            ScenarioConfig::default().compass.measurement_noise
        );
        assert_eq!(config.noise, NoiseConfig::default());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = scenario_from_str(
            r#"
            [noise]
            heading_stdev_deg = 3.0
            "#,
        );
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_non_positive_dt_is_rejected() {
        let result = scenario_from_str("[simulation]\ndt = 0.0\n");
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_negative_or_nan_noise_is_rejected() {
        let result = scenario_from_str("[noise]\nheading_stddev_deg = -1.0\n");
        assert!(matches!(result, Err(SimError::InvalidNoise(_))));

        let result = scenario_from_str("[decay]\nmeasurement_stddev = nan\n");
        assert!(matches!(result, Err(SimError::InvalidNoise(_))));

        let result = scenario_from_str("[kinematic]\nvelocity_stddev = -1e-3\n");
        assert!(matches!(result, Err(SimError::InvalidNoise(_))));
    }

    #[test]
    fn test_oversized_runs_are_rejected() {
        let result = scenario_from_str("[simulation]\ndt = 1e-12\n");
        assert!(matches!(result, Err(SimError::Config(_))));

        let result = scenario_from_str("[decay]\nsamples = 1000000000\n");
        assert!(matches!(result, Err(SimError::Config(_))));

        let result = scenario_from_str("[kinematic]\nsamples = 0\n");
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_bundled_scenarios_parse() {
        let tank = scenario_from_str(include_str!("../../../assets/scenarios/tank_steer.toml")).unwrap();
        assert_eq!(tank.simulation.kind, ScenarioKind::TankSteer);
        assert_eq!(tank.simulation.seed, Some(42));

        let decay = scenario_from_str(include_str!("../../../assets/scenarios/decay.toml")).unwrap();
        assert_eq!(decay.simulation.kind, ScenarioKind::Decay);
        assert_eq!(decay.decay, DecayConfig::default());

        let speed = scenario_from_str(include_str!("../../../assets/scenarios/speed.toml")).unwrap();
        assert_eq!(speed.simulation.kind, ScenarioKind::Speed);
        assert_eq!(speed.kinematic, KinematicConfig::default());

        let accel = scenario_from_str(include_str!("../../../assets/scenarios/accel.toml")).unwrap();
        assert_eq!(accel.simulation.kind, ScenarioKind::Accel);

        let unmeasured =
            scenario_from_str(include_str!("../../../assets/scenarios/unmeasured_accel.toml")).unwrap();
        assert_eq!(unmeasured.simulation.kind, ScenarioKind::UnmeasuredAccel);
    }

    #[test]
    fn test_cli_seed_overrides_the_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/scenarios/decay.toml");
        let config = load_scenario(Some(Path::new(path)), Some(99)).unwrap();
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.simulation.kind, ScenarioKind::Decay);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_scenario(Some(Path::new("does/not/exist.toml")), None);
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_bad_compass_tuning_is_an_estimation_error() {
        let result = scenario_from_str("[compass]\nderived_rate_smoothing = 1.5\n");
        assert!(matches!(result, Err(SimError::Estimation(_))));
    }
}
