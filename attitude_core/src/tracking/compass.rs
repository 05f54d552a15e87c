// attitude_core/src/tracking/compass.rs

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::{debug, warn};

use crate::error::{EstimationError, Result};
use crate::estimation::filters::kalman::{LinearKalmanFilter, SYMMETRY_TOLERANCE};
use crate::layout::{
    observation_matrix, CompassMeasurement, StateVariable, COMPASS_MEASUREMENT_DIM,
    COMPASS_MEASUREMENT_LAYOUT, HEADING_STATE_DIM, HEADING_STATE_LAYOUT,
};
use crate::models::dynamics::{ConstantRateModel, LinearDynamics};
use crate::state::is_symmetric;
use crate::tracking::angle::{fold_angle, HeadingDemodulator};
use crate::types::{HeadingProvider, HeadingRateProvider, TimeProvider};

// =========================================================================
// == Configuration ==
// =========================================================================

/// Tuning for a `FilteredCompass`. Every field has a default, so a partial
/// TOML table is enough to override just what is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompassConfig {
    /// How strongly the rate state advances the heading per second of `dt`.
    pub rate_coupling: f64,
    /// Process noise Q over `[heading, heading_rate]`.
    pub process_noise: [[f64; HEADING_STATE_DIM]; HEADING_STATE_DIM],
    /// Measurement noise R over `[heading, derived_rate, gyro_rate]`.
    pub measurement_noise: [[f64; COMPASS_MEASUREMENT_DIM]; COMPASS_MEASUREMENT_DIM],
    /// Initial covariance P.
    pub initial_covariance: [[f64; HEADING_STATE_DIM]; HEADING_STATE_DIM],
    /// Weight of the newest finite difference in the derived rate, in (0, 1].
    pub derived_rate_smoothing: f64,
    /// Readings beyond ±this value on opposite sides count as a wrap.
    pub wrap_threshold: f64,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            rate_coupling: 1.0,
            process_noise: [[0.05, 0.0], [0.0, 1.0]],
            measurement_noise: [[10.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
            initial_covariance: [[1.0, 0.0], [0.0, 1.0]],
            derived_rate_smoothing: 0.5,
            wrap_threshold: FRAC_PI_2,
        }
    }
}

impl CompassConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.derived_rate_smoothing > 0.0 && self.derived_rate_smoothing <= 1.0) {
            return Err(EstimationError::Configuration(format!(
                "derived_rate_smoothing must be in (0, 1], got {}",
                self.derived_rate_smoothing
            )));
        }
        if !(self.wrap_threshold > 0.0 && self.wrap_threshold < PI) {
            return Err(EstimationError::Configuration(format!(
                "wrap_threshold must be in (0, pi), got {}",
                self.wrap_threshold
            )));
        }
        if !self.rate_coupling.is_finite() {
            return Err(EstimationError::Configuration(
                "rate_coupling must be finite".to_string(),
            ));
        }
        check_noise_matrix("process_noise", &to_matrix(&self.process_noise))?;
        check_noise_matrix("measurement_noise", &to_matrix(&self.measurement_noise))?;
        check_noise_matrix("initial_covariance", &to_matrix(&self.initial_covariance))?;
        Ok(())
    }
}

fn check_noise_matrix(name: &str, m: &DMatrix<f64>) -> Result<()> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(EstimationError::Configuration(format!(
            "{name} must only hold finite entries"
        )));
    }
    if !is_symmetric(m, SYMMETRY_TOLERANCE) {
        return Err(EstimationError::Configuration(format!("{name} must be symmetric")));
    }
    Ok(())
}

fn to_matrix<const N: usize>(rows: &[[f64; N]; N]) -> DMatrix<f64> {
    DMatrix::from_fn(N, N, |r, c| rows[r][c])
}

// =========================================================================
// == Output ==
// =========================================================================

/// A snapshot of the compass filter after a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadingEstimate {
    /// Time of the sample that produced this estimate, seconds.
    pub timestamp: f64,
    /// Heading folded into the canonical circular range, radians.
    pub heading: f64,
    /// Unwrapped heading, radians.
    pub continuous_heading: f64,
    /// Angular rate, radians per second.
    pub angular_rate: f64,
    /// Variance of the heading estimate, radians².
    pub heading_variance: f64,
    /// Total wrap correction applied so far, radians.
    pub boost: f64,
}

// =========================================================================
// == The Filtered Compass ==
// =========================================================================

/// Fuses a wrapping compass bearing with a gyro rate into a smooth heading.
///
/// Internally the heading is tracked in a continuous, unbounded domain so the
/// linear filter never sees the ±π discontinuity. Results are folded back into
/// the circular range when reported.
///
/// One instance is one tracking session; nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct FilteredCompass {
    config: CompassConfig,
    filter: LinearKalmanFilter,
    dynamics: Box<dyn LinearDynamics>,
    demodulator: HeadingDemodulator,

    is_first_update: bool,
    last_update_timestamp: f64,
    last_estimated_heading: f64,
    last_estimated_rate: f64,
    last_derived_rate: f64,
}

impl FilteredCompass {
    /// Creates a compass filter using a `ConstantRateModel` built from the config.
    pub fn new(config: CompassConfig) -> Result<Self> {
        let dynamics = ConstantRateModel {
            rate_coupling: config.rate_coupling,
        };
        Self::with_dynamics(config, Box::new(dynamics))
    }

    /// Creates a compass filter with a custom two-state dynamics model.
    pub fn with_dynamics(config: CompassConfig, dynamics: Box<dyn LinearDynamics>) -> Result<Self> {
        config.validate()?;
        if dynamics.state_dim() != HEADING_STATE_DIM {
            return Err(EstimationError::Configuration(format!(
                "heading dynamics must have {} states, got {}",
                HEADING_STATE_DIM,
                dynamics.state_dim()
            )));
        }

        let mut filter = LinearKalmanFilter::new();
        filter.configure(
            dynamics.transition(0.0),
            to_matrix(&config.process_noise),
            observation_matrix(&COMPASS_MEASUREMENT_LAYOUT, &HEADING_STATE_LAYOUT),
            None,
        )?;
        filter.set_measurement_noise(to_matrix(&config.measurement_noise))?;
        // Start stationary.
        filter.set_state(
            DVector::zeros(HEADING_STATE_DIM),
            to_matrix(&config.initial_covariance),
        )?;

        Ok(Self {
            demodulator: HeadingDemodulator::new(config.wrap_threshold),
            config,
            filter,
            dynamics,
            is_first_update: true,
            last_update_timestamp: 0.0,
            last_estimated_heading: 0.0,
            last_estimated_rate: 0.0,
            last_derived_rate: 0.0,
        })
    }

    /// Pulls one sample from the data sources and runs an estimate cycle.
    pub fn update_from(
        &mut self,
        heading_provider: &dyn HeadingProvider,
        rate_provider: &dyn HeadingRateProvider,
        time_provider: &dyn TimeProvider,
    ) -> Result<HeadingEstimate> {
        let rate = rate_provider.angular_rate();
        let heading = heading_provider.heading();
        let now = time_provider.time();
        self.update_estimate(heading, rate, now)
    }

    /// Runs one estimate cycle on a raw compass heading (-π, π], a gyro rate and a timestamp.
    pub fn update_estimate(
        &mut self,
        heading_measured: f64,
        rate_measured: f64,
        now: f64,
    ) -> Result<HeadingEstimate> {
        if !(heading_measured.is_finite() && rate_measured.is_finite() && now.is_finite()) {
            return Err(EstimationError::Numerical(format!(
                "non-finite sample: heading={heading_measured}, rate={rate_measured}, t={now}"
            )));
        }

        if self.is_first_update {
            self.initialize(heading_measured, rate_measured, now)?;
            return Ok(self.estimate());
        }

        let dt = now - self.last_update_timestamp;
        if dt <= 0.0 {
            if dt < 0.0 {
                warn!(
                    now,
                    last = self.last_update_timestamp,
                    "time went backwards, dropping sample"
                );
            } else {
                debug!(now, "duplicate timestamp, dropping sample");
            }
            return Ok(self.estimate());
        }

        // Work on copies so a rejected sample leaves the compass untouched.
        let mut demodulator = self.demodulator;
        let heading_demod = demodulator.demodulate(heading_measured);

        let mut z = DVector::zeros(COMPASS_MEASUREMENT_DIM);
        z[CompassMeasurement::Heading.index()] = heading_demod;
        z[CompassMeasurement::DerivedRate.index()] = self.last_derived_rate;
        z[CompassMeasurement::GyroRate.index()] = rate_measured;

        let mut filter = self.filter.clone();
        filter.predict_over(dt, self.dynamics.as_ref(), None)?;
        filter.update(&z, None)?;

        let x = filter.state()?;
        let heading = x[StateVariable::Heading.index()];
        let rate = x[StateVariable::HeadingRate.index()];
        self.filter = filter;
        self.demodulator = demodulator;

        let alpha = self.config.derived_rate_smoothing;
        let finite_difference = (heading - self.last_estimated_heading) / dt;
        self.last_derived_rate = alpha * finite_difference + (1.0 - alpha) * self.last_derived_rate;

        self.last_estimated_heading = heading;
        self.last_estimated_rate = rate;
        self.last_update_timestamp = now;
        Ok(self.estimate())
    }

    /// The first sample only establishes the baseline: no elapsed time exists yet.
    /// The state vector is seeded from the readings; the covariance is left alone.
    fn initialize(&mut self, heading: f64, rate: f64, now: f64) -> Result<()> {
        self.demodulator.set_baseline(heading);

        let p = self.filter.covariance()?.clone();
        let mut x = DVector::zeros(HEADING_STATE_DIM);
        x[StateVariable::Heading.index()] = heading;
        x[StateVariable::HeadingRate.index()] = rate;
        self.filter.set_state(x, p)?;

        self.last_estimated_heading = heading;
        self.last_estimated_rate = rate;
        self.last_derived_rate = rate;
        self.last_update_timestamp = now;
        self.is_first_update = false;
        Ok(())
    }

    // --- Accessors ---

    /// The latest heading, folded into the circular range.
    pub fn filtered_heading(&self) -> f64 {
        fold_angle(self.last_estimated_heading)
    }

    /// The latest heading in the continuous, unwrapped domain.
    pub fn continuous_heading(&self) -> f64 {
        self.last_estimated_heading
    }

    pub fn filtered_angular_velocity(&self) -> f64 {
        self.last_estimated_rate
    }

    pub fn boost(&self) -> f64 {
        self.demodulator.boost()
    }

    pub fn has_baseline(&self) -> bool {
        !self.is_first_update
    }

    pub fn config(&self) -> &CompassConfig {
        &self.config
    }

    /// Read-only view of the underlying filter.
    pub fn filter(&self) -> &LinearKalmanFilter {
        &self.filter
    }

    pub fn estimate(&self) -> HeadingEstimate {
        let heading_variance = self
            .filter
            .covariance()
            .map(|p| {
                let i = StateVariable::Heading.index();
                p[(i, i)]
            })
            .unwrap_or(f64::NAN);

        HeadingEstimate {
            timestamp: self.last_update_timestamp,
            heading: self.filtered_heading(),
            continuous_heading: self.last_estimated_heading,
            angular_rate: self.last_estimated_rate,
            heading_variance,
            boost: self.demodulator.boost(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;
    use std::f64::consts::TAU;

    #[test]
    fn test_first_sample_is_baseline_only() {
        let mut compass = FilteredCompass::new(CompassConfig::default()).unwrap();
        let p_before = compass.filter().covariance().unwrap().clone();

        let est = compass.update_estimate(1.0, 0.2, 10.0).unwrap();

        assert_eq!(compass.filter().covariance().unwrap(), &p_before);
        assert_eq!(est.continuous_heading, 1.0);
        assert_abs_diff_eq!(est.heading, 1.0, epsilon = 1e-12);
        assert_eq!(est.angular_rate, 0.2);
        assert_eq!(est.timestamp, 10.0);
        assert!(!est.heading_variance.is_nan());
        assert!(compass.has_baseline());
    }

    #[test]
    fn test_duplicate_timestamp_is_dropped() {
        let mut compass = FilteredCompass::new(CompassConfig::default()).unwrap();
        compass.update_estimate(0.0, 0.0, 0.0).unwrap();
        let first = compass.update_estimate(0.1, 1.0, 0.1).unwrap();
        let p = compass.filter().covariance().unwrap().clone();

        let repeated = compass.update_estimate(2.0, 5.0, 0.1).unwrap();
        assert_eq!(repeated, first);
        assert_eq!(compass.filter().covariance().unwrap(), &p);

        let backwards = compass.update_estimate(2.0, 5.0, 0.05).unwrap();
        assert_eq!(backwards, first);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CompassConfig {
            derived_rate_smoothing: 0.0,
            ..CompassConfig::default()
        };
        assert!(matches!(
            FilteredCompass::new(config),
            Err(EstimationError::Configuration(_))
        ));
    }

    #[test]
    fn test_non_finite_or_asymmetric_tuning_is_rejected() {
        let mut nan_r = CompassConfig::default();
        nan_r.measurement_noise[2][2] = f64::NAN;
        assert!(matches!(
            FilteredCompass::new(nan_r),
            Err(EstimationError::Configuration(_))
        ));

        let mut skewed_q = CompassConfig::default();
        skewed_q.process_noise[0][1] = 0.3;
        assert!(matches!(
            skewed_q.validate(),
            Err(EstimationError::Configuration(_))
        ));

        let mut infinite_p0 = CompassConfig::default();
        infinite_p0.initial_covariance[1][1] = f64::INFINITY;
        assert!(infinite_p0.validate().is_err());
    }

    #[test]
    fn test_rejected_update_leaves_the_compass_untouched() {
        // All-zero noise makes the innovation covariance singular on the first real update.
        let config = CompassConfig {
            process_noise: [[0.0; 2]; 2],
            measurement_noise: [[0.0; 3]; 3],
            initial_covariance: [[0.0; 2]; 2],
            ..CompassConfig::default()
        };
        let mut compass = FilteredCompass::new(config.clone()).unwrap();
        assert_eq!(compass.config(), &config);

        let baseline = compass.update_estimate(3.0, 0.0, 0.0).unwrap();
        let p = compass.filter().covariance().unwrap().clone();

        // Crosses the +pi boundary, so the demodulator would add a full turn.
        let result = compass.update_estimate(-3.0, 0.0, 0.1);
        assert!(matches!(result, Err(EstimationError::Numerical(_))));

        assert_eq!(compass.boost(), 0.0);
        assert_eq!(compass.filter().covariance().unwrap(), &p);
        assert_eq!(compass.estimate(), baseline);
    }

    #[test]
    fn test_non_finite_sample_is_rejected() {
        let mut compass = FilteredCompass::new(CompassConfig::default()).unwrap();
        assert!(matches!(
            compass.update_estimate(f64::NAN, 0.0, 0.0),
            Err(EstimationError::Numerical(_))
        ));
        assert!(!compass.has_baseline());
    }

    #[test]
    fn test_tracks_a_steady_turn_through_the_wrap() {
        let rate = 0.8;
        let dt = 0.1;
        let mut compass = FilteredCompass::new(CompassConfig::default()).unwrap();

        let mut last = None;
        for i in 0..50 {
            let t = i as f64 * dt;
            let truth = 2.5 + rate * t;
            last = Some(compass.update_estimate(fold_angle(truth), rate, t).unwrap());
        }
        let est = last.unwrap();
        let truth = 2.5 + rate * 4.9;

        assert_abs_diff_eq!(est.continuous_heading, truth, epsilon = 1e-6);
        assert_abs_diff_eq!(est.heading, fold_angle(truth), epsilon = 1e-6);
        assert_abs_diff_eq!(est.angular_rate, rate, epsilon = 1e-9);
        assert_abs_diff_eq!(est.boost, TAU, epsilon = 1e-12);
    }

    struct FakeSensors {
        heading: Cell<f64>,
        rate: Cell<f64>,
        time: Cell<f64>,
    }

    impl HeadingProvider for FakeSensors {
        fn heading(&self) -> f64 {
            self.heading.get()
        }
    }

    impl HeadingRateProvider for FakeSensors {
        fn angular_rate(&self) -> f64 {
            self.rate.get()
        }
    }

    impl TimeProvider for FakeSensors {
        fn time(&self) -> f64 {
            self.time.get()
        }
    }

    #[test]
    fn test_update_from_providers_matches_direct_update() {
        let sensors = FakeSensors {
            heading: Cell::new(-3.0),
            rate: Cell::new(-0.5),
            time: Cell::new(1.0),
        };
        let mut pulled = FilteredCompass::new(CompassConfig::default()).unwrap();
        let mut pushed = pulled.clone();

        for step in 0..20 {
            let t = 1.0 + 0.05 * step as f64;
            let heading = fold_angle(-3.0 - 0.5 * (t - 1.0));
            sensors.time.set(t);
            sensors.heading.set(heading);

            let a = pulled.update_from(&sensors, &sensors, &sensors).unwrap();
            let b = pushed.update_estimate(heading, -0.5, t).unwrap();
            assert_eq!(a, b);
        }
        assert_abs_diff_eq!(pulled.boost(), -TAU);
    }
}
