// attitude_sim/src/simulation/scenarios/kinematic.rs

use rand_distr::Distribution;

use super::{check_sample_count, zero_mean, KinematicSample};
use crate::simulation::config::KinematicConfig;
use crate::simulation::core::{error::SimResult, prng::SimulationRng};

/// Generates a position that decays by `process_rate` every sample, with its
/// velocity and acceleration taken as backward differences.
///
/// The real position wobbles around the ideal one, so the real velocity and
/// acceleration are dominated by that wobble. The first sample is exact.
pub fn generate(
    dt: f64,
    config: &KinematicConfig,
    rng: &mut SimulationRng,
) -> SimResult<Vec<KinematicSample>> {
    let wobble = zero_mean("process_stddev", config.process_stddev)?;
    let sensors = [
        zero_mean("position_stddev", config.position_stddev)?,
        zero_mean("velocity_stddev", config.velocity_stddev)?,
        zero_mean("acceleration_stddev", config.acceleration_stddev)?,
    ];
    check_sample_count("kinematic run", config.samples as f64)?;

    let mut samples = Vec::with_capacity(config.samples);
    let first_ideal = [config.initial_position, 0.0, 0.0];
    let first_actual = [config.initial_position, config.initial_velocity, 0.0];
    samples.push(KinematicSample {
        time: 0.0,
        ideal: first_ideal,
        actual: first_actual,
        measured: first_actual,
    });

    let (mut ideal, mut actual) = (first_ideal, first_actual);
    for i in 1..config.samples {
        let position = ideal[0] * config.process_rate;
        let next_ideal = differentiate(position, &ideal, dt);
        let next_actual = differentiate(position + wobble.sample(&mut rng.0), &actual, dt);

        let mut measured = next_actual;
        for (reading, sensor) in measured.iter_mut().zip(&sensors) {
            *reading += sensor.sample(&mut rng.0);
        }

        samples.push(KinematicSample {
            time: i as f64 * dt,
            ideal: next_ideal,
            actual: next_actual,
            measured,
        });
        ideal = next_ideal;
        actual = next_actual;
    }
    Ok(samples)
}

/// `[x, (x - x₋₁)/dt, (v - v₋₁)/dt]` from the new position and the previous sample.
fn differentiate(position: f64, previous: &[f64; 3], dt: f64) -> [f64; 3] {
    let velocity = (position - previous[0]) / dt;
    let acceleration = (velocity - previous[1]) / dt;
    [position, velocity, acceleration]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_derivatives_are_backward_differences() {
        let config = KinematicConfig {
            samples: 20,
            ..KinematicConfig::default()
        };
        let mut rng = SimulationRng::from_seed_option(Some(4));
        let samples = generate(0.1, &config, &mut rng).unwrap();

        assert_eq!(samples.len(), 20);
        assert_eq!(samples[0].measured, [100.0, -50.0, 0.0]);
        assert_eq!(samples[0].ideal, [100.0, 0.0, 0.0]);

        for pair in samples.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_relative_eq!(
                next.actual[1],
                (next.actual[0] - prev.actual[0]) / 0.1,
                max_relative = 1e-12
            );
            assert_relative_eq!(
                next.actual[2],
                (next.actual[1] - prev.actual[1]) / 0.1,
                max_relative = 1e-12
            );
            assert_relative_eq!(
                next.ideal[0],
                prev.ideal[0] * config.process_rate,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_noiseless_measurements_equal_the_truth() {
        let config = KinematicConfig {
            samples: 10,
            process_stddev: 0.0,
            position_stddev: 0.0,
            velocity_stddev: 0.0,
            acceleration_stddev: 0.0,
            ..KinematicConfig::default()
        };
        let mut rng = SimulationRng::from_seed_option(Some(4));
        let samples = generate(0.1, &config, &mut rng).unwrap();

        for s in &samples[1..] {
            assert_eq!(s.measured, s.actual);
            assert_eq!(s.actual[0], s.ideal[0]);
        }
    }
}
