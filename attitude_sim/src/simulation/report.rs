// attitude_sim/src/simulation/report.rs

use serde::Serialize;
use std::fmt;

/// Running root-mean-square of an error signal.
///
/// This is the "typical error" of a run: not strictly a standard deviation,
/// since the mean error is not removed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RmsAccumulator {
    sum_sq: f64,
    count: usize,
}

impl RmsAccumulator {
    pub fn push(&mut self, error: f64) {
        self.sum_sq += error * error;
        self.count += 1;
    }

    /// NaN until something has been pushed.
    pub fn rms(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            (self.sum_sq / self.count as f64).sqrt()
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Scores of a tank-steer run. Angles in degrees for readability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadingReport {
    pub samples: usize,
    /// Typical error of the filtered heading against the real heading.
    pub heading_rms_deg: f64,
    /// Typical error of the raw compass against the real heading.
    pub compass_rms_deg: f64,
    pub rate_rms_deg_s: f64,
    pub gyro_rms_deg_s: f64,
    /// Total wrap correction at the end of the run, radians.
    pub final_boost: f64,
}

/// Scores of a decay run, where both estimators track the same data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecayReport {
    pub samples: usize,
    pub estimate_rms: f64,
    pub prediction_rms: f64,
    pub measurement_rms: f64,
    /// Largest absolute disagreement between the matrix and scalar filters.
    pub max_filter_disagreement: f64,
}

/// Typical errors of one state variable against its real value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisReport {
    pub estimate_rms: f64,
    pub prediction_rms: f64,
    /// `None` when the variable has no sensor.
    pub measurement_rms: Option<f64>,
}

/// Scores of a position / velocity (/ acceleration) run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KinematicReport {
    pub samples: usize,
    pub position: AxisReport,
    pub velocity: AxisReport,
    /// Only present when the filter tracks acceleration.
    pub acceleration: Option<AxisReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum TrackingReport {
    TankSteer(HeadingReport),
    Decay(DecayReport),
    Speed(KinematicReport),
    Accel(KinematicReport),
    UnmeasuredAccel(KinematicReport),
}

impl fmt::Display for AxisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "typical error {:.4}, typical deviation from prediction {:.4}",
            self.estimate_rms, self.prediction_rms
        )?;
        match self.measurement_rms {
            Some(rms) => write!(f, " (measurement alone {rms:.4})"),
            None => write!(f, " (not measured)"),
        }
    }
}

impl fmt::Display for KinematicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  X: {}\n  V: {}", self.position, self.velocity)?;
        if let Some(acceleration) = &self.acceleration {
            write!(f, "\n  A: {acceleration}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TrackingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingReport::TankSteer(r) => write!(
                f,
                "Tank steer ({} samples): typical yaw error {:.2} deg (compass alone {:.2} deg), \
                 typical yaw rate error {:.2} deg/s (gyro alone {:.2} deg/s)",
                r.samples, r.heading_rms_deg, r.compass_rms_deg, r.rate_rms_deg_s, r.gyro_rms_deg_s
            ),
            TrackingReport::Decay(r) => write!(
                f,
                "Decay ({} samples): typical error {:.4} (measurement alone {:.4}), \
                 typical deviation from prediction {:.4}, filters disagree by at most {:e}",
                r.samples,
                r.estimate_rms,
                r.measurement_rms,
                r.prediction_rms,
                r.max_filter_disagreement
            ),
            TrackingReport::Speed(r) => write!(f, "Speed KF ({} samples):\n{r}", r.samples),
            TrackingReport::Accel(r) => write!(f, "Accel KF ({} samples):\n{r}", r.samples),
            TrackingReport::UnmeasuredAccel(r) => {
                write!(f, "Unmeasured accel KF ({} samples):\n{r}", r.samples)
            }
        }
    }
}
