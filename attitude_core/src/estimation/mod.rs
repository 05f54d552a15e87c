// attitude_core/src/estimation/mod.rs

//! Recursive linear estimators.
//!
//! `LinearKalmanFilter` is the general n-state, m-measurement recursion.
//! `ScalarKalmanFilter` is the one-state specialization, kept as an
//! independent reference the general filter can be checked against.

pub mod filters;
