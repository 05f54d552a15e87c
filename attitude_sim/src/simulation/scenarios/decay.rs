// attitude_sim/src/simulation/scenarios/decay.rs

use rand_distr::Distribution;

use super::{check_sample_count, zero_mean, DecaySample};
use crate::simulation::config::DecayConfig;
use crate::simulation::core::{error::SimResult, prng::SimulationRng};

/// Generates a value that shrinks by `process_rate` every sample.
///
/// The first sample is exact: no wobble and no measurement noise.
pub fn generate(dt: f64, config: &DecayConfig, rng: &mut SimulationRng) -> SimResult<Vec<DecaySample>> {
    let wobble = zero_mean("process_stddev", config.process_stddev)?;
    let sensor = zero_mean("measurement_stddev", config.measurement_stddev)?;
    check_sample_count("decay run", config.samples as f64)?;

    let mut samples = Vec::with_capacity(config.samples);
    let mut ideal = config.initial_value;
    samples.push(DecaySample {
        time: 0.0,
        ideal,
        actual: ideal,
        measured: ideal,
    });

    for i in 1..config.samples {
        ideal *= config.process_rate;
        let actual = ideal + wobble.sample(&mut rng.0);
        samples.push(DecaySample {
            time: i as f64 * dt,
            ideal,
            actual,
            measured: actual + sensor.sample(&mut rng.0),
        });
    }
    Ok(samples)
}
