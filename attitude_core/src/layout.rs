// attitude_core/src/layout.rs

use nalgebra::DMatrix;

/// Every variable that can exist in the heading state vector.
/// The order of `HEADING_STATE_LAYOUT` defines the indices into `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    /// Continuous (unwrapped) heading, radians.
    Heading,
    /// Angular rate about the heading axis, radians per second.
    HeadingRate,
}

/// The dimension of the heading state vector.
pub const HEADING_STATE_DIM: usize = 2;

/// The standard `[heading, heading_rate]` layout.
pub const HEADING_STATE_LAYOUT: [StateVariable; HEADING_STATE_DIM] =
    [StateVariable::Heading, StateVariable::HeadingRate];

impl StateVariable {
    /// Index of this variable in `HEADING_STATE_LAYOUT`.
    pub fn index(self) -> usize {
        match self {
            StateVariable::Heading => 0,
            StateVariable::HeadingRate => 1,
        }
    }
}

/// The rows of the measurement vector `z` fed to the heading filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompassMeasurement {
    /// The demodulated compass bearing.
    Heading,
    /// Smoothed finite difference of the filter's own previous output.
    DerivedRate,
    /// The raw gyro reading.
    GyroRate,
}

/// The dimension of the compass measurement vector.
pub const COMPASS_MEASUREMENT_DIM: usize = 3;

/// The standard `[heading, derived_rate, gyro_rate]` measurement layout.
pub const COMPASS_MEASUREMENT_LAYOUT: [CompassMeasurement; COMPASS_MEASUREMENT_DIM] = [
    CompassMeasurement::Heading,
    CompassMeasurement::DerivedRate,
    CompassMeasurement::GyroRate,
];

impl CompassMeasurement {
    /// Index of this row in `COMPASS_MEASUREMENT_LAYOUT`.
    pub fn index(self) -> usize {
        match self {
            CompassMeasurement::Heading => 0,
            CompassMeasurement::DerivedRate => 1,
            CompassMeasurement::GyroRate => 2,
        }
    }

    /// The state variable this measurement observes directly.
    pub fn observes(self) -> StateVariable {
        match self {
            CompassMeasurement::Heading => StateVariable::Heading,
            CompassMeasurement::DerivedRate | CompassMeasurement::GyroRate => {
                StateVariable::HeadingRate
            }
        }
    }
}

/// Builds the observation matrix `H` for a measurement layout against a state layout.
/// Each measurement row has a single 1.0 in the column of the variable it observes.
pub fn observation_matrix(
    measurements: &[CompassMeasurement],
    states: &[StateVariable],
) -> DMatrix<f64> {
    DMatrix::from_fn(measurements.len(), states.len(), |row, col| {
        if measurements[row].observes() == states[col] {
            1.0
        } else {
            0.0
        }
    })
}
