// attitude_core/src/models/dynamics.rs

use dyn_clone::DynClone;
use nalgebra::DMatrix;
use std::fmt::Debug;

use crate::layout::{StateVariable, HEADING_STATE_DIM};

/// A linear, time-invariant model of how the state evolves over an interval.
///
/// Estimators ask the model for a fresh transition matrix every cycle, so a
/// filter fed at an irregular rate never reuses an `F` built for a stale `dt`.
pub trait LinearDynamics: DynClone + Debug + Send + Sync {
    /// Returns the number of states (the size of `F`).
    fn state_dim(&self) -> usize;

    /// Builds the discrete transition matrix `F` for an interval of `dt` seconds.
    fn transition(&self, dt: f64) -> DMatrix<f64>;
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn LinearDynamics>`.
dyn_clone::clone_trait_object!(LinearDynamics);

/// Constant angular rate over the interval.
///
/// ```text
/// F = | 1  coupling·dt |
///     | 0       1      |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantRateModel {
    /// How strongly the rate state advances the heading state per second.
    /// 1.0 is plain kinematics.
    pub rate_coupling: f64,
}

impl Default for ConstantRateModel {
    fn default() -> Self {
        Self { rate_coupling: 1.0 }
    }
}

impl LinearDynamics for ConstantRateModel {
    fn state_dim(&self) -> usize {
        HEADING_STATE_DIM
    }

    fn transition(&self, dt: f64) -> DMatrix<f64> {
        let heading = StateVariable::Heading.index();
        let rate = StateVariable::HeadingRate.index();

        let mut f = DMatrix::identity(HEADING_STATE_DIM, HEADING_STATE_DIM);
        f[(heading, rate)] = self.rate_coupling * dt;
        f
    }
}
