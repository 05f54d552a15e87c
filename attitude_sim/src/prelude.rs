// attitude_sim/src/prelude.rs

// Re-export the entire attitude_core prelude so binaries can reach the
// estimators, the provider traits and the compass types from one place.
pub use attitude_core::prelude::*;

// Re-export common simulation-specific types.
pub use crate::simulation::config::{load_scenario, scenario_from_str, ScenarioConfig, ScenarioKind};
pub use crate::simulation::core::error::{SimError, SimResult};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::playback::ScenarioPlayer;
pub use crate::simulation::report::TrackingReport;
pub use crate::simulation::runner::run_scenario;
pub use crate::simulation::scenarios::{DecaySample, KinematicSample, SensorSample};
