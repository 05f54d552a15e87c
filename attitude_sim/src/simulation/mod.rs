// attitude_sim/src/simulation/mod.rs

pub mod config;
pub mod core;
pub mod playback;
pub mod report;
pub mod runner;
pub mod scenarios;
