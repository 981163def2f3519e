// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

/// Output gain of the scaled tanh: 1.7159 · tanh(2/3 · net).
pub const TANSIG_GAIN: f64 = 1.7159;

/// Net-input slope of the scaled tanh.
pub const TANSIG_SLOPE: f64 = 2.0 / 3.0;

/// Maximum number of closed-loop steps in one rollout.
pub const ROLLOUT_STEP_CAP: usize = 1000;

/// One-sided finite-difference step for the actuator's signal sensitivity.
pub const ACTUATOR_FD_STEP: f64 = 1e-5;

/// Actuator relaxation time constant [s].
pub const ACTUATOR_TIME_CONSTANT: f64 = 0.25;

/// Initial line-search baseline step of the conjugate-gradient trainer.
pub const INITIAL_LEARNING_STEP: f64 = 1e-3;

/// Lower bound of the conjugate-gradient line-search baseline.
pub const LEARNING_STEP_FLOOR: f64 = 1e-280;

/// Lower bound of the stochastic trainer's adaptive learning rate.
pub const LEARNING_RATE_FLOOR: f64 = 1e-200;

/// Golden-section interval ratio.
pub const GOLDEN_TAU: f64 = 0.618;

/// Golden-section refinement iterations.
pub const GOLDEN_SECTION_ITERATIONS: usize = 8;

/// Baseline growth after a successful line-search trial.
pub const BASELINE_GROWTH: f64 = 1.1;

/// Baseline shrink after a failed first trial.
pub const BASELINE_SHRINK: f64 = 0.1;

/// Adaptive-rate trials per stochastic pick.
pub const STOCHASTIC_TRIALS: usize = 30;
