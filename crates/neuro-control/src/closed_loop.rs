// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Closed-Loop Plant
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Regulator + frozen emulator + actuator, differentiated step by step.
//!
//! One step:
//! 1. regulator on the full state → raw signal, rescaled and clamped to ±1;
//! 2. emulator on a slice of the state plus the signal → normalized deltas;
//! 3. each delta updates one state component through an affine map;
//! 4. the actuator component relaxes toward the signal;
//! 5. penalty on the new state, terminal once `state[c] ≥ threshold`.
//!
//! The global Jacobian `d state / d θ_regulator` is carried alongside.

use crate::actuator::FirstOrderActuator;
use ndarray::{Array1, Array2};
use neuro_core::jacobian::{propagate_jacobians, JacobianMode};
use neuro_core::network::TansigNetwork;
use neuro_core::rollout::{Plant, StepContext, StepOutcome};
use neuro_types::constants::{ROLLOUT_STEP_CAP, TANSIG_GAIN};
use neuro_types::error::{NeuroError, NeuroResult};
use tracing::debug;

/// `next[state_index] = current[state_index] + offset + gain·emulator_output`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaMap {
    pub state_index: usize,
    pub offset: f64,
    pub gain: f64,
}

/// Rollout ends once `state[component] ≥ threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalCondition {
    pub component: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone)]
pub struct ClosedLoopPlant {
    state_dim: usize,
    emulator_inputs: Vec<usize>,
    delta_maps: Vec<DeltaMap>,
    actuator_index: usize,
    actuator: FirstOrderActuator,
    signal_gain: f64,
    dt: f64,
    terminal: TerminalCondition,
    desired_terminal: Array1<f64>,
    terminal_weights: Array1<f64>,
    desired_transient: Array1<f64>,
    transient_weights: Array1<f64>,
}

impl ClosedLoopPlant {
    /// Plant with default actuator, signal gain `1/1.7159`, unit terminal
    /// weights toward zero and no transient penalty.
    pub fn new(
        state_dim: usize,
        emulator_inputs: Vec<usize>,
        delta_maps: Vec<DeltaMap>,
        actuator_index: usize,
        dt: f64,
        terminal: TerminalCondition,
    ) -> NeuroResult<Self> {
        if state_dim == 0 {
            return Err(NeuroError::ConfigError("state dimension must be > 0".to_string()));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(NeuroError::ConfigError(format!("dt must be finite and > 0, got {dt}")));
        }
        if let Some(&bad) = emulator_inputs.iter().find(|&&i| i >= state_dim) {
            return Err(NeuroError::ConfigError(format!(
                "emulator input index {bad} outside state of size {state_dim}"
            )));
        }
        let mut touched = vec![false; state_dim];
        for map in &delta_maps {
            if map.state_index >= state_dim {
                return Err(NeuroError::ConfigError(format!(
                    "delta map index {} outside state of size {state_dim}",
                    map.state_index
                )));
            }
            if touched[map.state_index] {
                return Err(NeuroError::ConfigError(format!(
                    "state component {} has more than one delta map",
                    map.state_index
                )));
            }
            touched[map.state_index] = true;
        }
        if actuator_index >= state_dim || touched[actuator_index] {
            return Err(NeuroError::ConfigError(format!(
                "actuator index {actuator_index} must be a state component no delta map touches"
            )));
        }
        if terminal.component >= state_dim {
            return Err(NeuroError::ConfigError(format!(
                "terminal component {} outside state of size {state_dim}",
                terminal.component
            )));
        }

        debug!(
            state_dim,
            emulator_inputs = emulator_inputs.len(),
            delta_maps = delta_maps.len(),
            "closed-loop plant configured"
        );
        Ok(ClosedLoopPlant {
            state_dim,
            emulator_inputs,
            delta_maps,
            actuator_index,
            actuator: FirstOrderActuator::default(),
            signal_gain: 1.0 / TANSIG_GAIN,
            dt,
            terminal,
            desired_terminal: Array1::zeros(state_dim),
            terminal_weights: Array1::ones(state_dim),
            desired_transient: Array1::zeros(state_dim),
            transient_weights: Array1::zeros(state_dim),
        })
    }

    pub fn with_actuator(mut self, actuator: FirstOrderActuator) -> Self {
        self.actuator = actuator;
        self
    }

    pub fn with_signal_gain(mut self, signal_gain: f64) -> Self {
        self.signal_gain = signal_gain;
        self
    }

    pub fn with_terminal_penalty(mut self, desired: Array1<f64>, weights: Array1<f64>) -> NeuroResult<Self> {
        self.check_len("terminal", &desired, &weights)?;
        self.desired_terminal = desired;
        self.terminal_weights = weights;
        Ok(self)
    }

    pub fn with_transient_penalty(mut self, desired: Array1<f64>, weights: Array1<f64>) -> NeuroResult<Self> {
        self.check_len("transient", &desired, &weights)?;
        self.desired_transient = desired;
        self.transient_weights = weights;
        Ok(self)
    }

    fn check_len(&self, what: &str, desired: &Array1<f64>, weights: &Array1<f64>) -> NeuroResult<()> {
        if desired.len() != self.state_dim || weights.len() != self.state_dim {
            return Err(NeuroError::ConfigError(format!(
                "{what} penalty vectors must have {} entries, got {} and {}",
                self.state_dim,
                desired.len(),
                weights.len()
            )));
        }
        Ok(())
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Check that the networks fit this plant's layout.
    pub fn check_networks(&self, emulator: &TansigNetwork, regulator: &TansigNetwork) -> NeuroResult<()> {
        if regulator.input_count() != self.state_dim || regulator.output_count() != 1 {
            return Err(NeuroError::Precondition(format!(
                "regulator must map {} state components to 1 signal, got {} → {}",
                self.state_dim,
                regulator.input_count(),
                regulator.output_count()
            )));
        }
        if emulator.input_count() != self.emulator_inputs.len() + 1
            || emulator.output_count() != self.delta_maps.len()
        {
            return Err(NeuroError::Precondition(format!(
                "emulator must map {} inputs to {} deltas, got {} → {}",
                self.emulator_inputs.len() + 1,
                self.delta_maps.len(),
                emulator.input_count(),
                emulator.output_count()
            )));
        }
        Ok(())
    }

    /// Rescale then clamp the regulator output. Returns `(signal, saturated)`.
    fn control_signal(&self, raw: f64) -> (f64, bool) {
        let scaled = raw * self.signal_gain;
        (scaled.clamp(-1.0, 1.0), scaled.abs() > 1.0)
    }

    fn emulator_input(&self, state: &Array1<f64>, signal: f64) -> Array1<f64> {
        self.emulator_inputs
            .iter()
            .map(|&i| state[i])
            .chain(std::iter::once(signal))
            .collect()
    }

    /// Write `next` from the current state, signal and emulator deltas.
    fn apply_dynamics(&self, current: &Array1<f64>, signal: f64, deltas: &Array1<f64>, next: &mut Array1<f64>) {
        next.assign(current);
        for (j, map) in self.delta_maps.iter().enumerate() {
            next[map.state_index] = current[map.state_index] + map.offset + map.gain * deltas[j];
        }
        let a = self.actuator_index;
        next[a] = self.actuator.step(current[a], signal, self.dt);
    }

    fn is_terminal(&self, state: &Array1<f64>) -> bool {
        state[self.terminal.component] >= self.terminal.threshold
    }

    fn transient_penalty(&self, state: &Array1<f64>) -> f64 {
        weighted_penalty(&self.desired_transient, &self.transient_weights, state) * self.dt
    }

    fn terminal_penalty(&self, state: &Array1<f64>) -> f64 {
        weighted_penalty(&self.desired_terminal, &self.terminal_weights, state)
    }
}

fn weighted_penalty(desired: &Array1<f64>, weights: &Array1<f64>, state: &Array1<f64>) -> f64 {
    desired
        .iter()
        .zip(weights.iter())
        .zip(state.iter())
        .map(|((d, w), s)| {
            let e = w * (d - s);
            e * e
        })
        .sum()
}

/// `gradient += scale · Σ_i −2·w_i²·(d_i − s_i)·J_i`.
fn accumulate_penalty_gradient(
    gradient: &mut Array1<f64>,
    jacobian: &Array2<f64>,
    desired: &Array1<f64>,
    weights: &Array1<f64>,
    state: &Array1<f64>,
    scale: f64,
) {
    for (i, row) in jacobian.outer_iter().enumerate() {
        let w = weights[i];
        if w == 0.0 {
            continue;
        }
        let coef = -2.0 * w * w * (desired[i] - state[i]) * scale;
        gradient.scaled_add(coef, &row);
    }
}

impl Plant for ClosedLoopPlant {
    fn check(&self, emulator: &TansigNetwork, regulator: &TansigNetwork) -> NeuroResult<()> {
        self.check_networks(emulator, regulator)
    }

    fn step(&self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let columns = ctx.gradient.len();

        ctx.regulator_jacobians.input_mut().assign(&*ctx.global_jacobian);
        let raw = propagate_jacobians(
            ctx.regulator,
            ctx.current_state,
            ctx.regulator_jacobians,
            JacobianMode::OwnParameters,
        );
        let (signal, saturated) = self.control_signal(raw[0]);
        let signal_row: Array1<f64> = if saturated {
            Array1::zeros(columns)
        } else {
            &ctx.regulator_jacobians.output().row(0) * self.signal_gain
        };

        {
            let seed = ctx.emulator_jacobians.input_mut();
            for (r, &s) in self.emulator_inputs.iter().enumerate() {
                seed.row_mut(r).assign(&ctx.global_jacobian.row(s));
            }
            seed.row_mut(self.emulator_inputs.len()).assign(&signal_row);
        }
        let emulator_input = self.emulator_input(ctx.current_state, signal);
        let deltas = propagate_jacobians(
            ctx.emulator,
            &emulator_input,
            ctx.emulator_jacobians,
            JacobianMode::ExternalOnly,
        );

        self.apply_dynamics(ctx.current_state, signal, &deltas, ctx.next_state);

        // Every updated row depends only on its own old row, so rows are
        // rewritten in place.
        let emulator_jacobian = ctx.emulator_jacobians.output();
        for (j, map) in self.delta_maps.iter().enumerate() {
            let mut row = ctx.global_jacobian.row_mut(map.state_index);
            row.scaled_add(map.gain, &emulator_jacobian.row(j));
        }
        let a = self.actuator_index;
        let a_state = self.actuator.state_derivative(self.dt);
        let a_signal = self
            .actuator
            .signal_derivative(ctx.current_state[a], signal, self.dt);
        {
            let mut row = ctx.global_jacobian.row_mut(a);
            row *= a_state;
            row.scaled_add(a_signal, &signal_row);
        }

        let next = &*ctx.next_state;
        if self.is_terminal(next) || ctx.force_terminal {
            if ctx.iteration > 0 {
                *ctx.gradient /= ctx.iteration as f64;
            }
            accumulate_penalty_gradient(
                ctx.gradient,
                ctx.global_jacobian,
                &self.desired_terminal,
                &self.terminal_weights,
                next,
                1.0,
            );
            StepOutcome {
                error: self.terminal_penalty(next),
                finished: true,
            }
        } else {
            accumulate_penalty_gradient(
                ctx.gradient,
                ctx.global_jacobian,
                &self.desired_transient,
                &self.transient_weights,
                next,
                self.dt,
            );
            StepOutcome {
                error: self.transient_penalty(next),
                finished: false,
            }
        }
    }

    fn rollout_error(
        &self,
        emulator: &TansigNetwork,
        regulator: &TansigNetwork,
        initial_state: &Array1<f64>,
        horizon: usize,
    ) -> f64 {
        let cap = if horizon > 0 {
            horizon.min(ROLLOUT_STEP_CAP)
        } else {
            ROLLOUT_STEP_CAP
        };
        let mut state = initial_state.clone();
        let mut next = Array1::zeros(state.len());
        let mut transient = 0.0;
        let mut terminal = 0.0;
        let mut steps = 0;
        while steps < cap {
            let (signal, _) = self.control_signal(regulator.eval(&state)[0]);
            let deltas = emulator.eval(&self.emulator_input(&state, signal));
            self.apply_dynamics(&state, signal, &deltas, &mut next);
            steps += 1;

            let last = steps == cap;
            let finished = if horizon > 0 { last } else { last || self.is_terminal(&next) };
            if finished {
                terminal = self.terminal_penalty(&next);
                break;
            }
            transient += self.transient_penalty(&next);
            std::mem::swap(&mut state, &mut next);
        }
        if steps > 1 {
            transient /= (steps - 1) as f64;
        }
        transient + terminal
    }
}
