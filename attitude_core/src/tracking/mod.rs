// attitude_core/src/tracking/mod.rs

//! Adapting a circular compass bearing to the linear Kalman recursion and back.

pub mod angle;
pub mod compass;
