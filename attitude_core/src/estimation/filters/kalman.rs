// attitude_core/src/estimation/filters/kalman.rs

use nalgebra::{DMatrix, DVector};

use crate::error::{EstimationError, Result};
use crate::models::dynamics::LinearDynamics;
use crate::state::{is_symmetric, GaussianState};
use crate::types::{Control, State};

/// Relative tolerance for the covariance symmetry check after an update.
pub(crate) const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// The matrices describing a discrete linear system.
///
/// ```text
/// x_k+1 = F x_k + B u_k + w,   w ~ N(0, Q)
/// z_k   = H x_k + v,           v ~ N(0, R)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    /// The state transition matrix (F), n×n.
    pub transition_f: DMatrix<f64>,
    /// The process noise covariance matrix (Q), n×n.
    pub process_noise_q: DMatrix<f64>,
    /// The observation matrix (H), m×n.
    pub observation_h: DMatrix<f64>,
    /// The optional control matrix (B), n×c.
    pub control_b: Option<DMatrix<f64>>,
}

impl LinearModel {
    /// Checks that all matrices are mutually conformant.
    pub fn validate(&self) -> Result<()> {
        let n = self.transition_f.nrows();
        if n == 0 || !self.transition_f.is_square() {
            return Err(EstimationError::Configuration(format!(
                "F must be square and non-empty, got {}x{}",
                self.transition_f.nrows(),
                self.transition_f.ncols()
            )));
        }
        check_shape("Q", &self.process_noise_q, n, n)?;

        let m = self.observation_h.nrows();
        if m == 0 {
            return Err(EstimationError::Configuration(
                "H must have at least one row".to_string(),
            ));
        }
        check_shape("H", &self.observation_h, m, n)?;

        if let Some(b) = &self.control_b {
            if b.nrows() != n {
                return Err(EstimationError::Configuration(format!(
                    "B must have {} rows, got {}",
                    n,
                    b.nrows()
                )));
            }
        }
        Ok(())
    }

    pub fn state_dim(&self) -> usize {
        self.transition_f.nrows()
    }

    pub fn measurement_dim(&self) -> usize {
        self.observation_h.nrows()
    }

    pub fn control_dim(&self) -> usize {
        self.control_b.as_ref().map_or(0, |b| b.ncols())
    }
}

/// A discrete-time linear Kalman filter.
///
/// The lifecycle is: `configure` once, `set_state` once, then `predict`/`update`
/// as many times as needed. The filter does not enforce one predict per update;
/// that discipline belongs to the caller.
#[derive(Debug, Clone, Default)]
pub struct LinearKalmanFilter {
    model: Option<LinearModel>,
    /// The held measurement noise covariance matrix (R), used when `update` is not given one.
    measurement_noise_r: Option<DMatrix<f64>>,
    state: Option<GaussianState>,

    // Diagnostics from the last update.
    gain: Option<DMatrix<f64>>,
    innovation: Option<DVector<f64>>,
}

impl LinearKalmanFilter {
    /// Creates an unconfigured filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter that is already configured with the given model.
    pub fn with_model(model: LinearModel) -> Result<Self> {
        let mut filter = Self::new();
        filter.configure(
            model.transition_f,
            model.process_noise_q,
            model.observation_h,
            model.control_b,
        )?;
        Ok(filter)
    }

    // --- Configuration ---

    /// Stores F, Q, H and the optional B.
    ///
    /// Re-configuring keeps the current state, as long as the state dimension
    /// does not change.
    pub fn configure(
        &mut self,
        transition_f: DMatrix<f64>,
        process_noise_q: DMatrix<f64>,
        observation_h: DMatrix<f64>,
        control_b: Option<DMatrix<f64>>,
    ) -> Result<()> {
        let model = LinearModel {
            transition_f,
            process_noise_q,
            observation_h,
            control_b,
        };
        model.validate()?;

        if let Some(state) = &self.state {
            if state.dim() != model.state_dim() {
                return Err(EstimationError::Configuration(format!(
                    "cannot re-configure a {}-state filter with a {}-state model",
                    state.dim(),
                    model.state_dim()
                )));
            }
        }
        if let Some(r) = &self.measurement_noise_r {
            check_shape("R", r, model.measurement_dim(), model.measurement_dim())?;
        }

        self.model = Some(model);
        Ok(())
    }

    /// Sets the initial state `x` and covariance `P`.
    pub fn set_state(&mut self, x: State, p: DMatrix<f64>) -> Result<()> {
        let n = self.model()?.state_dim();
        if x.nrows() != n {
            return Err(EstimationError::Configuration(format!(
                "x must have {} rows, got {}",
                n,
                x.nrows()
            )));
        }
        check_shape("P", &p, n, n)?;

        let state = GaussianState::new(x, p);
        if !state.is_finite() {
            return Err(EstimationError::Configuration(
                "initial state and covariance must be finite".to_string(),
            ));
        }
        if !is_symmetric(&state.covariance, SYMMETRY_TOLERANCE) {
            return Err(EstimationError::Configuration(
                "initial covariance must be symmetric".to_string(),
            ));
        }

        self.state = Some(state);
        Ok(())
    }

    /// Replaces F in place. Used when the sampling interval changes between cycles.
    pub fn set_transition(&mut self, transition_f: DMatrix<f64>) -> Result<()> {
        let model = self.model_mut()?;
        let n = model.state_dim();
        check_shape("F", &transition_f, n, n)?;
        model.transition_f = transition_f;
        Ok(())
    }

    /// Holds a fixed measurement noise R for updates that are not given one.
    pub fn set_measurement_noise(&mut self, measurement_noise_r: DMatrix<f64>) -> Result<()> {
        let m = self.model()?.measurement_dim();
        check_shape("R", &measurement_noise_r, m, m)?;
        self.measurement_noise_r = Some(measurement_noise_r);
        Ok(())
    }

    // --- The Kalman recursion ---

    /// Advances the state one step with the current F.
    ///
    /// `x ← F·x (+ B·u)`, `P ← F·P·Fᵀ + Q`
    pub fn predict(&mut self, u: Option<&Control>) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EstimationError::State("predict called before configure".to_string()))?;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| EstimationError::State("predict called before set_state".to_string()))?;

        let f = &model.transition_f;
        let mut x_pred = f * &state.vector;

        if let Some(u) = u {
            let b = model.control_b.as_ref().ok_or_else(|| {
                EstimationError::Configuration(
                    "control vector given but no control matrix B is configured".to_string(),
                )
            })?;
            if u.nrows() != b.ncols() {
                return Err(EstimationError::Configuration(format!(
                    "u must have {} rows, got {}",
                    b.ncols(),
                    u.nrows()
                )));
            }
            x_pred += b * u;
        }

        let p_pred = f * &state.covariance * f.transpose() + &model.process_noise_q;

        state.vector = x_pred;
        state.covariance = p_pred;
        Ok(())
    }

    /// Derives F from `dynamics` for an interval of `dt` seconds and predicts, in one step.
    pub fn predict_over(
        &mut self,
        dt: f64,
        dynamics: &dyn LinearDynamics,
        u: Option<&Control>,
    ) -> Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(EstimationError::State(format!(
                "prediction interval must be positive and finite, got {dt}"
            )));
        }
        self.set_transition(dynamics.transition(dt))?;
        self.predict(u)
    }

    /// Fuses a measurement `z`, with `r` overriding the held R for this call only.
    ///
    /// On error the state is left exactly as it was before the call.
    pub fn update(&mut self, z: &DVector<f64>, r: Option<&DMatrix<f64>>) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EstimationError::State("update called before configure".to_string()))?;
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| EstimationError::State("update called before set_state".to_string()))?;

        let m = model.measurement_dim();
        if z.nrows() != m {
            return Err(EstimationError::Configuration(format!(
                "z must have {} rows, got {}",
                m,
                z.nrows()
            )));
        }
        let r = r.or(self.measurement_noise_r.as_ref()).ok_or_else(|| {
            EstimationError::Configuration(
                "no measurement noise R given and none is held".to_string(),
            )
        })?;
        check_shape("R", r, m, m)?;

        let h = &model.observation_h;
        let p = &state.covariance;
        let h_t = h.transpose();

        // 1. Innovation and its covariance.
        let y = z - h * &state.vector;
        let s = h * p * &h_t + r;

        // 2. Kalman gain.
        let s_inv = s.try_inverse().ok_or_else(|| {
            EstimationError::Numerical("innovation covariance S is singular".to_string())
        })?;
        let k_gain = p * &h_t * s_inv;

        // 3. Corrected state and covariance.
        let x_new = &state.vector + &k_gain * &y;
        let n = state.dim();
        let i_kh = DMatrix::<f64>::identity(n, n) - &k_gain * h;
        let p_new = i_kh * p;

        let updated = GaussianState::new(x_new, p_new);
        if !updated.is_finite() {
            return Err(EstimationError::Numerical(
                "state or covariance became non-finite after update".to_string(),
            ));
        }
        if !is_symmetric(&updated.covariance, SYMMETRY_TOLERANCE) {
            return Err(EstimationError::Numerical(
                "covariance became asymmetric after update".to_string(),
            ));
        }

        self.state = Some(updated);
        self.gain = Some(k_gain);
        self.innovation = Some(y);
        Ok(())
    }

    // --- Accessors ---

    /// The current state estimate `x`.
    pub fn state(&self) -> Result<&State> {
        self.gaussian().map(|s| &s.vector)
    }

    /// The current covariance `P`.
    pub fn covariance(&self) -> Result<&DMatrix<f64>> {
        self.gaussian().map(|s| &s.covariance)
    }

    /// The full `(x, P)` belief.
    pub fn gaussian(&self) -> Result<&GaussianState> {
        self.state
            .as_ref()
            .ok_or_else(|| EstimationError::State("filter state is not initialized".to_string()))
    }

    /// The configured model, if any.
    pub fn model(&self) -> Result<&LinearModel> {
        self.model
            .as_ref()
            .ok_or_else(|| EstimationError::State("filter is not configured".to_string()))
    }

    /// The held measurement noise R, if any.
    pub fn measurement_noise(&self) -> Option<&DMatrix<f64>> {
        self.measurement_noise_r.as_ref()
    }

    /// The Kalman gain from the last successful update.
    pub fn gain(&self) -> Option<&DMatrix<f64>> {
        self.gain.as_ref()
    }

    /// The innovation `y` from the last successful update.
    pub fn innovation(&self) -> Option<&DVector<f64>> {
        self.innovation.as_ref()
    }

    /// n, once configured.
    pub fn state_dim(&self) -> Option<usize> {
        self.model.as_ref().map(LinearModel::state_dim)
    }

    /// m, once configured.
    pub fn measurement_dim(&self) -> Option<usize> {
        self.model.as_ref().map(LinearModel::measurement_dim)
    }

    /// c, once configured. Zero without a control matrix.
    pub fn control_dim(&self) -> Option<usize> {
        self.model.as_ref().map(LinearModel::control_dim)
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn model_mut(&mut self) -> Result<&mut LinearModel> {
        self.model
            .as_mut()
            .ok_or_else(|| EstimationError::State("filter is not configured".to_string()))
    }
}

fn check_shape(name: &str, m: &DMatrix<f64>, rows: usize, cols: usize) -> Result<()> {
    if m.nrows() != rows || m.ncols() != cols {
        return Err(EstimationError::Configuration(format!(
            "{} must be {}x{}, got {}x{}",
            name,
            rows,
            cols,
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}
