// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — First-Order Actuator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! First-order actuator lag, integrated in closed form over one step:
//! `next = desired + (current − desired)·exp(−dt/τ)`.

use neuro_types::constants::{ACTUATOR_FD_STEP, ACTUATOR_TIME_CONSTANT};
use neuro_types::error::{NeuroError, NeuroResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderActuator {
    /// τ [s].
    pub time_constant: f64,
}

impl Default for FirstOrderActuator {
    fn default() -> Self {
        FirstOrderActuator {
            time_constant: ACTUATOR_TIME_CONSTANT,
        }
    }
}

impl FirstOrderActuator {
    pub fn new(time_constant: f64) -> NeuroResult<Self> {
        if !time_constant.is_finite() || time_constant <= 0.0 {
            return Err(NeuroError::ConfigError(format!(
                "actuator time constant must be finite and > 0, got {time_constant}"
            )));
        }
        Ok(FirstOrderActuator { time_constant })
    }

    /// Fraction of the current offset that survives one step.
    pub fn decay(&self, dt: f64) -> f64 {
        (-dt / self.time_constant).exp()
    }

    pub fn step(&self, current: f64, desired: f64, dt: f64) -> f64 {
        desired + (current - desired) * self.decay(dt)
    }

    /// ∂next/∂current.
    pub fn state_derivative(&self, dt: f64) -> f64 {
        self.decay(dt)
    }

    /// ∂next/∂desired by one-sided finite difference.
    pub fn signal_derivative(&self, current: f64, desired: f64, dt: f64) -> f64 {
        let base = self.step(current, desired, dt);
        let bumped = self.step(current, desired + ACTUATOR_FD_STEP, dt);
        (bumped - base) / ACTUATOR_FD_STEP
    }
}
