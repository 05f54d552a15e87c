// attitude_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::error::{EstimationError, Result};
pub use crate::models::dynamics::LinearDynamics;
pub use crate::types::{Control, HeadingProvider, HeadingRateProvider, State, TimeProvider};

// --- Core Data Structures ---
pub use crate::layout::{CompassMeasurement, StateVariable};
pub use crate::state::GaussianState;

// --- Estimation Algorithms ---
pub use crate::estimation::filters::kalman::{LinearKalmanFilter, LinearModel};
pub use crate::estimation::filters::scalar::ScalarKalmanFilter;

// --- Heading Tracking ---
pub use crate::models::dynamics::ConstantRateModel;
pub use crate::tracking::angle::{fold_angle, HeadingDemodulator};
pub use crate::tracking::compass::{CompassConfig, FilteredCompass, HeadingEstimate};
