// attitude_sim/src/simulation/core/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// A newtype wrapper around `ChaCha8Rng`.
/// This is the single, deterministic pseudo-random number generator for a scenario run.
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    /// Seeds deterministically when a seed is given, otherwise from OS entropy.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => {
                info!("Seeding simulation RNG with {}", seed);
                Self(ChaCha8Rng::seed_from_u64(seed))
            }
            None => {
                info!("No seed configured, seeding simulation RNG from entropy");
                Self(ChaCha8Rng::from_entropy())
            }
        }
    }
}
