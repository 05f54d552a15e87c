// attitude_core/src/tracking/angle.rs

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use tracing::debug;

/// Maps any angle into its canonical circular range: `((θ + π) mod 2π) − π`.
pub fn fold_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Turns a sequence of circular bearings into an unbounded, continuous one.
///
/// A wrap is declared when two consecutive readings sit on opposite sides of
/// `±threshold` with opposite signs. This only works while the true rotation
/// between samples stays well below π; a larger real turn within one sample is
/// indistinguishable from a wrap and will be mis-detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingDemodulator {
    /// Total correction applied so far, always a multiple of 2π.
    boost: f64,
    last_raw: Option<f64>,
    threshold: f64,
}

impl Default for HeadingDemodulator {
    fn default() -> Self {
        Self::new(FRAC_PI_2)
    }
}

impl HeadingDemodulator {
    pub fn new(threshold: f64) -> Self {
        Self {
            boost: 0.0,
            last_raw: None,
            threshold,
        }
    }

    /// Records a reading as the reference for the next wrap check, without demodulating it.
    pub fn set_baseline(&mut self, raw: f64) {
        self.last_raw = Some(raw);
    }

    /// Returns the continuous equivalent of `raw`, updating the accumulated boost.
    pub fn demodulate(&mut self, raw: f64) -> f64 {
        if let Some(previous) = self.last_raw {
            if previous > self.threshold && raw < -self.threshold {
                // Crossed +π going up.
                self.boost += TAU;
                debug!(previous, raw, boost = self.boost, "heading wrapped past +pi");
            } else if previous < -self.threshold && raw > self.threshold {
                // Crossed -π going down.
                self.boost -= TAU;
                debug!(previous, raw, boost = self.boost, "heading wrapped past -pi");
            }
        }
        self.last_raw = Some(raw);
        raw + self.boost
    }

    pub fn boost(&self) -> f64 {
        self.boost
    }

    pub fn last_raw(&self) -> Option<f64> {
        self.last_raw
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fold_angle() {
        assert_abs_diff_eq!(fold_angle(0.0), 0.0);
        assert_abs_diff_eq!(fold_angle(4.0 * PI), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fold_angle(PI + 0.1), -PI + 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(fold_angle(-PI - 0.1), PI - 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(fold_angle(7.0), 7.0 - TAU, epsilon = 1e-12);
        // The fold is half-open: +π lands on -π.
        assert_abs_diff_eq!(fold_angle(PI), -PI);
    }

    #[test]
    fn test_crossing_plus_pi_is_continuous() {
        let mut demod = HeadingDemodulator::default();
        let out: Vec<f64> = [3.0, 3.1, -3.1, -3.0]
            .iter()
            .map(|&raw| demod.demodulate(raw))
            .collect();

        for pair in out.windows(2) {
            let step = pair[1] - pair[0];
            assert!(step >= 0.0, "sequence went backwards: {out:?}");
            assert!((step - 0.1).abs() < 0.02, "unexpected step {step} in {out:?}");
        }
        assert_abs_diff_eq!(demod.boost(), TAU);
    }

    #[test]
    fn test_crossing_minus_pi_is_continuous() {
        let mut demod = HeadingDemodulator::default();
        let out: Vec<f64> = [-3.0, -3.1, 3.1, 3.0]
            .iter()
            .map(|&raw| demod.demodulate(raw))
            .collect();

        for pair in out.windows(2) {
            let step = pair[1] - pair[0];
            assert!(step <= 0.0);
            assert!((step + 0.1).abs() < 0.02);
        }
        assert_abs_diff_eq!(demod.boost(), -TAU);
    }

    #[test]
    fn test_small_motion_near_zero_does_not_wrap() {
        let mut demod = HeadingDemodulator::default();
        for raw in [0.2, -0.3, 1.4, -1.4, 0.0] {
            assert_eq!(demod.demodulate(raw), raw);
        }
        assert_eq!(demod.boost(), 0.0);
    }

    #[test]
    fn test_baseline_counts_as_previous_reading() {
        let mut demod = HeadingDemodulator::default();
        assert_eq!(demod.threshold(), FRAC_PI_2);
        assert_eq!(demod.last_raw(), None);

        demod.set_baseline(3.1);
        assert_eq!(demod.last_raw(), Some(3.1));
        assert_eq!(demod.boost(), 0.0);

        let out = demod.demodulate(-3.1);
        assert_abs_diff_eq!(out, TAU - 3.1, epsilon = 1e-12);
        assert_eq!(demod.last_raw(), Some(-3.1));
    }
}
