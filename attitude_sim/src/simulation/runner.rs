// attitude_sim/src/simulation/runner.rs

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use attitude_core::prelude::*;

use crate::simulation::config::{DecayConfig, KinematicConfig, ScenarioConfig, ScenarioKind};
use crate::simulation::core::{error::SimResult, prng::SimulationRng};
use crate::simulation::playback::ScenarioPlayer;
use crate::simulation::report::{
    AxisReport, DecayReport, HeadingReport, KinematicReport, RmsAccumulator, TrackingReport,
};
use crate::simulation::scenarios::{
    decay, kinematic, tank_steer, DecaySample, KinematicSample, SensorSample,
};

/// Generates the configured scenario and runs the estimators over it.
pub fn run_scenario(config: &ScenarioConfig, rng: &mut SimulationRng) -> SimResult<TrackingReport> {
    let dt = config.simulation.dt;
    match config.simulation.kind {
        ScenarioKind::TankSteer => {
            let samples = tank_steer::generate(dt, &config.noise, rng)?;
            info!("Generated {} tank-steer samples at dt = {}s", samples.len(), dt);
            let report = run_tank_steer(samples, &config.compass)?;
            Ok(TrackingReport::TankSteer(report))
        }
        ScenarioKind::Decay => {
            let samples = decay::generate(dt, &config.decay, rng)?;
            info!("Generated {} decay samples at dt = {}s", samples.len(), dt);
            let report = run_decay(&samples, &config.decay)?;
            Ok(TrackingReport::Decay(report))
        }
        ScenarioKind::Speed | ScenarioKind::Accel | ScenarioKind::UnmeasuredAccel => {
            let samples = kinematic::generate(dt, &config.kinematic, rng)?;
            info!("Generated {} kinematic samples at dt = {}s", samples.len(), dt);
            let (model, wrap): (KinematicModel, fn(KinematicReport) -> TrackingReport) =
                match config.simulation.kind {
                    ScenarioKind::Speed => (KinematicModel::Speed, TrackingReport::Speed),
                    ScenarioKind::Accel => (KinematicModel::Accel, TrackingReport::Accel),
                    _ => (KinematicModel::UnmeasuredAccel, TrackingReport::UnmeasuredAccel),
                };
            let report = run_kinematic(&samples, &config.kinematic, dt, model)?;
            Ok(wrap(report))
        }
    }
}

/// Plays the samples through a `FilteredCompass` and scores it against the truth.
pub fn run_tank_steer(samples: Vec<SensorSample>, compass: &CompassConfig) -> SimResult<HeadingReport> {
    let mut filter = FilteredCompass::new(compass.clone())?;
    let mut player = ScenarioPlayer::new(samples);

    let mut heading_error = RmsAccumulator::default();
    let mut compass_error = RmsAccumulator::default();
    let mut rate_error = RmsAccumulator::default();
    let mut gyro_error = RmsAccumulator::default();

    while let Some(sample) = player.current().copied() {
        let estimate = filter.update_from(&player, &player, &player)?;

        // Headings are compared on the circle; the truth is unwrapped, the readings are not.
        heading_error.push(fold_angle(estimate.heading - sample.true_heading));
        compass_error.push(fold_angle(sample.heading - sample.true_heading));
        rate_error.push(estimate.angular_rate - sample.true_rate);
        gyro_error.push(sample.angular_rate - sample.true_rate);

        debug!(
            t = sample.time,
            measured = sample.heading,
            estimated = estimate.heading,
            truth = fold_angle(sample.true_heading),
            rate = estimate.angular_rate,
            boost = estimate.boost,
            "heading estimate"
        );
        player.advance();
    }

    Ok(HeadingReport {
        samples: heading_error.count(),
        heading_rms_deg: heading_error.rms().to_degrees(),
        compass_rms_deg: compass_error.rms().to_degrees(),
        rate_rms_deg_s: rate_error.rms().to_degrees(),
        gyro_rms_deg_s: gyro_error.rms().to_degrees(),
        final_boost: filter.boost(),
    })
}

/// Tracks the decaying value with the matrix filter and the scalar filter side by side.
///
/// Both start from the first (exact) measurement with unit variance.
pub fn run_decay(samples: &[DecaySample], config: &DecayConfig) -> SimResult<DecayReport> {
    let f = config.process_rate;
    let q = config.process_stddev.powi(2);
    let r = config.measurement_stddev.powi(2);

    let mut matrix = LinearKalmanFilter::with_model(LinearModel {
        transition_f: DMatrix::from_element(1, 1, f),
        process_noise_q: DMatrix::from_element(1, 1, q),
        observation_h: DMatrix::identity(1, 1),
        control_b: None,
    })?;
    matrix.set_measurement_noise(DMatrix::from_element(1, 1, r))?;
    let mut scalar = ScalarKalmanFilter::new(f, q, 1.0, 0.0, r);

    let x0 = samples.first().map_or(config.initial_value, |s| s.measured);
    matrix.set_state(DVector::from_element(1, x0), DMatrix::identity(1, 1))?;
    scalar.set_state(x0);
    scalar.set_covariance(1.0);

    let mut estimate_error = RmsAccumulator::default();
    let mut prediction_error = RmsAccumulator::default();
    let mut measurement_error = RmsAccumulator::default();
    let mut max_disagreement: f64 = 0.0;

    for sample in samples.iter().skip(1) {
        matrix.predict(None)?;
        scalar.predict(0.0);
        let prediction = matrix.state()?[0];

        matrix.update(&DVector::from_element(1, sample.measured), None)?;
        scalar.update(sample.measured, None)?;
        let estimate = matrix.state()?[0];

        debug!(
            t = sample.time,
            measured = sample.measured,
            predicted = prediction,
            estimated = estimate,
            actual = sample.actual,
            "decay estimate"
        );
        max_disagreement = max_disagreement.max((estimate - scalar.state()).abs());
        estimate_error.push(sample.actual - estimate);
        prediction_error.push(sample.actual - prediction);
        measurement_error.push(sample.actual - sample.measured);
    }

    Ok(DecayReport {
        samples: samples.len(),
        estimate_rms: estimate_error.rms(),
        prediction_rms: prediction_error.rms(),
        measurement_rms: measurement_error.rms(),
        max_filter_disagreement: max_disagreement,
    })
}

// =========================================================================
// == Kinematic Filters ==
// =========================================================================

/// Which states the filter tracks and which of them have a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KinematicModel {
    /// `[x, v]`, both measured.
    Speed,
    /// `[x, v, a]`, all measured.
    Accel,
    /// `[x, v, a]`, only `x` and `v` measured.
    UnmeasuredAccel,
}

impl KinematicModel {
    pub fn state_dim(self) -> usize {
        match self {
            KinematicModel::Speed => 2,
            KinematicModel::Accel | KinematicModel::UnmeasuredAccel => 3,
        }
    }

    pub fn measurement_dim(self) -> usize {
        match self {
            KinematicModel::Speed | KinematicModel::UnmeasuredAccel => 2,
            KinematicModel::Accel => 3,
        }
    }

    /// F, Q and H for a sampling interval of `dt`.
    ///
    /// Only the position gets process noise. The speed model decays its
    /// velocity at the process rate; the acceleration models integrate a
    /// constant acceleration instead.
    pub fn linear_model(self, dt: f64, config: &KinematicConfig) -> LinearModel {
        let n = self.state_dim();
        let transition_f = match self {
            KinematicModel::Speed => {
                DMatrix::from_row_slice(2, 2, &[1.0, dt, 0.0, config.process_rate])
            }
            _ => DMatrix::from_row_slice(3, 3, &[1.0, dt, 0.0, 0.0, 1.0, dt, 0.0, 0.0, 1.0]),
        };
        let mut process_noise_q = DMatrix::zeros(n, n);
        process_noise_q[(0, 0)] = config.process_stddev.powi(2);

        LinearModel {
            transition_f,
            process_noise_q,
            observation_h: DMatrix::identity(self.measurement_dim(), n),
            control_b: None,
        }
    }

    pub fn measurement_noise(self, config: &KinematicConfig) -> DMatrix<f64> {
        let variances = [
            config.position_stddev.powi(2),
            config.velocity_stddev.powi(2),
            config.acceleration_stddev.powi(2),
        ];
        let m = self.measurement_dim();
        DMatrix::from_diagonal(&DVector::from_column_slice(&variances[..m]))
    }
}

/// Tracks the kinematic samples with the chosen model and scores every state.
///
/// The filter starts from the first (exact) readings, with zero for any
/// unmeasured state, and unit covariance.
pub fn run_kinematic(
    samples: &[KinematicSample],
    config: &KinematicConfig,
    dt: f64,
    model: KinematicModel,
) -> SimResult<KinematicReport> {
    let n = model.state_dim();
    let m = model.measurement_dim();

    let mut filter = LinearKalmanFilter::with_model(model.linear_model(dt, config))?;
    filter.set_measurement_noise(model.measurement_noise(config))?;

    let first = samples.first().map_or(
        [config.initial_position, config.initial_velocity, 0.0],
        |s| s.measured,
    );
    let x0 = DVector::from_fn(n, |i, _| if i < m { first[i] } else { 0.0 });
    filter.set_state(x0, DMatrix::identity(n, n))?;

    let mut estimate_error = [RmsAccumulator::default(); 3];
    let mut prediction_error = [RmsAccumulator::default(); 3];
    let mut measurement_error = [RmsAccumulator::default(); 3];

    for sample in samples.iter().skip(1) {
        filter.predict(None)?;
        let prediction = filter.state()?.clone();

        let z = DVector::from_fn(m, |i, _| sample.measured[i]);
        filter.update(&z, None)?;
        let estimate = filter.state()?;

        debug!(
            t = sample.time,
            measured_x = sample.measured[0],
            estimated_x = estimate[0],
            estimated_v = estimate[1],
            actual_x = sample.actual[0],
            "kinematic estimate"
        );
        for i in 0..n {
            estimate_error[i].push(sample.actual[i] - estimate[i]);
            prediction_error[i].push(sample.actual[i] - prediction[i]);
        }
        for i in 0..m {
            measurement_error[i].push(sample.actual[i] - sample.measured[i]);
        }
    }

    let axis = |i: usize| AxisReport {
        estimate_rms: estimate_error[i].rms(),
        prediction_rms: prediction_error[i].rms(),
        measurement_rms: (i < m).then(|| measurement_error[i].rms()),
    };
    Ok(KinematicReport {
        samples: samples.len(),
        position: axis(0),
        velocity: axis(1),
        acceleration: (n > 2).then(|| axis(2)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::structs::tank_steer_compass;
    use crate::simulation::config::NoiseConfig;

    #[test]
    fn test_tank_steer_beats_the_raw_compass() {
        for seed in [1, 7, 42, 1234, 98765] {
            let mut rng = SimulationRng::from_seed_option(Some(seed));
            let samples = tank_steer::generate(0.1, &NoiseConfig::default(), &mut rng).unwrap();
            let report = run_tank_steer(samples, &tank_steer_compass()).unwrap();

            assert_eq!(report.samples, 70);
            assert!(
                report.heading_rms_deg < report.compass_rms_deg,
                "seed {seed}: {report:?}"
            );
            assert!(report.final_boost.abs() <= 2.0 * std::f64::consts::TAU);
        }
    }

    #[test]
    fn test_decay_filters_agree_and_smooth_the_measurements() {
        let config = DecayConfig::default();
        let mut rng = SimulationRng::from_seed_option(Some(5));
        let samples = decay::generate(0.1, &config, &mut rng).unwrap();
        let report = run_decay(&samples, &config).unwrap();

        assert_eq!(report.samples, config.samples);
        assert_eq!(report.max_filter_disagreement, 0.0);
        assert!(report.estimate_rms < report.measurement_rms, "{report:?}");
    }

    #[test]
    fn test_run_scenario_dispatches_on_kind() {
        let mut config = ScenarioConfig::default();
        config.simulation.kind = ScenarioKind::Decay;
        config.decay.samples = 50;

        let mut rng = SimulationRng::from_seed_option(Some(11));
        let report = run_scenario(&config, &mut rng).unwrap();
        assert!(matches!(report, TrackingReport::Decay(DecayReport { samples: 50, .. })));
    }

    #[test]
    fn test_bad_compass_tuning_surfaces_as_an_error() {
        let mut config = ScenarioConfig::default();
        config.compass.wrap_threshold = 0.0;

        let mut rng = SimulationRng::from_seed_option(Some(11));
        assert!(run_scenario(&config, &mut rng).is_err());
    }

    fn kinematic_run(model: KinematicModel, seed: u64) -> KinematicReport {
        let config = KinematicConfig::default();
        let mut rng = SimulationRng::from_seed_option(Some(seed));
        let samples = kinematic::generate(0.1, &config, &mut rng).unwrap();
        run_kinematic(&samples, &config, 0.1, model).unwrap()
    }

    fn assert_finite(axis: &AxisReport) {
        assert!(axis.estimate_rms.is_finite() && axis.prediction_rms.is_finite(), "{axis:?}");
    }

    #[test]
    fn test_kinematic_models_have_the_expected_shapes() {
        let config = KinematicConfig::default();
        let speed = KinematicModel::Speed.linear_model(0.1, &config);
        assert_eq!(speed.transition_f[(1, 1)], config.process_rate);
        assert_eq!(speed.observation_h, DMatrix::identity(2, 2));

        let unmeasured = KinematicModel::UnmeasuredAccel.linear_model(0.1, &config);
        assert_eq!(unmeasured.measurement_dim(), 2);
        assert_eq!(unmeasured.state_dim(), 3);
        assert_eq!(unmeasured.transition_f[(1, 2)], 0.1);
        assert_eq!(unmeasured.process_noise_q[(0, 0)], 25.0);
        assert_eq!(unmeasured.process_noise_q[(2, 2)], 0.0);

        let r = KinematicModel::Accel.measurement_noise(&config);
        assert_eq!(r.shape(), (3, 3));
        assert_eq!(r[(0, 0)], 4.0);
    }

    #[test]
    fn test_speed_filter_corrects_its_predictions() {
        for seed in [1, 3, 42] {
            let report = kinematic_run(KinematicModel::Speed, seed);

            assert_eq!(report.samples, 1000);
            assert!(report.acceleration.is_none());
            assert_finite(&report.position);
            assert_finite(&report.velocity);
            assert!(
                report.position.estimate_rms < report.position.prediction_rms,
                "seed {seed}: {report:?}"
            );
            assert!(report.velocity.measurement_rms.unwrap() < 0.01);
        }
    }

    #[test]
    fn test_accel_filter_tracks_all_three_states() {
        let report = kinematic_run(KinematicModel::Accel, 3);

        let acceleration = report.acceleration.unwrap();
        assert_finite(&report.position);
        assert_finite(&acceleration);
        assert!(acceleration.measurement_rms.is_some());
        assert!(report.position.estimate_rms < report.position.prediction_rms, "{report:?}");
    }

    #[test]
    fn test_unmeasured_acceleration_is_still_estimated() {
        let report = kinematic_run(KinematicModel::UnmeasuredAccel, 3);

        let acceleration = report.acceleration.unwrap();
        assert_finite(&acceleration);
        assert_eq!(acceleration.measurement_rms, None);
        assert!(report.velocity.measurement_rms.is_some());
        assert!(report.position.estimate_rms < report.position.prediction_rms, "{report:?}");
    }

    #[test]
    fn test_run_scenario_runs_every_kinematic_kind() {
        for kind in [ScenarioKind::Speed, ScenarioKind::Accel, ScenarioKind::UnmeasuredAccel] {
            let mut config = ScenarioConfig::default();
            config.simulation.kind = kind;
            config.kinematic.samples = 100;

            let mut rng = SimulationRng::from_seed_option(Some(11));
            let report = run_scenario(&config, &mut rng).unwrap();
            let samples = match (kind, report) {
                (ScenarioKind::Speed, TrackingReport::Speed(r))
                | (ScenarioKind::Accel, TrackingReport::Accel(r))
                | (ScenarioKind::UnmeasuredAccel, TrackingReport::UnmeasuredAccel(r)) => r.samples,
                other => panic!("unexpected report for {other:?}"),
            };
            assert_eq!(samples, 100);
        }
    }
}
