// attitude_sim/src/simulation/core/mod.rs

pub mod error;
pub mod prng;
