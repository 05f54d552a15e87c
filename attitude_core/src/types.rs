// attitude_core/src/types.rs

use nalgebra::DVector;

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Control = DVector<f64>;

// --- Core Traits for Sensor Data Sources ---
// These are implemented by whatever supplies the data: live sensors or a
// recorded/synthetic playback. The core only ever calls them synchronously.

/// A source of absolute heading readings (e.g. a digital compass).
pub trait HeadingProvider {
    /// The current heading in radians, within (-π, π].
    fn heading(&self) -> f64;
}

/// A source of angular rate readings about the heading axis (e.g. a gyro).
pub trait HeadingRateProvider {
    /// The current angular rate in radians per second, signed, right-hand convention.
    fn angular_rate(&self) -> f64;
}

/// A clock. Must be monotonically non-decreasing for a given tracking session.
pub trait TimeProvider {
    /// The current time in seconds.
    fn time(&self) -> f64;
}
