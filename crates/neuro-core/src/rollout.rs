// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Closed-Loop Rollout Differentiation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Generic rollout driver for regulator training through a frozen emulator.
//!
//! A [`Plant`] supplies the per-step dynamics and penalties. The driver owns
//! the loop, the step cap and the transient/terminal bookkeeping, and writes
//! the realized step count back into the [`TrainingProcess`].

use crate::jacobian::LayerJacobians;
use crate::network::TansigNetwork;
use ndarray::{Array1, Array2};
use neuro_types::constants::ROLLOUT_STEP_CAP;
use neuro_types::error::{NeuroError, NeuroResult};
use rayon::prelude::*;
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// Everything one step of the closed loop may read or write.
pub struct StepContext<'a> {
    pub emulator: &'a TansigNetwork,
    pub regulator: &'a TansigNetwork,
    pub current_state: &'a Array1<f64>,
    pub next_state: &'a mut Array1<f64>,
    pub emulator_jacobians: &'a mut LayerJacobians,
    pub regulator_jacobians: &'a mut LayerJacobians,
    /// `d state / d regulator parameters`, rows = state components.
    pub global_jacobian: &'a mut Array2<f64>,
    /// Running gradient of the rollout error.
    pub gradient: &'a mut Array1<f64>,
    /// Zero-based step index.
    pub iteration: usize,
    /// Last permitted step: the plant must treat it as terminal.
    pub force_terminal: bool,
}

/// Result of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub error: f64,
    pub finished: bool,
}

/// Closed-loop dynamics and penalties.
pub trait Plant: Send + Sync {
    /// Reject networks whose shapes do not fit this plant.
    fn check(&self, emulator: &TansigNetwork, regulator: &TansigNetwork) -> NeuroResult<()>;

    /// Advance one step, write `next_state` and the updated global Jacobian,
    /// accumulate into `gradient`, and report the step's penalty.
    fn step(&self, ctx: &mut StepContext<'_>) -> StepOutcome;

    /// Rollout error without derivatives. `horizon == 0` runs until the
    /// terminal condition (or the step cap); otherwise exactly `horizon`
    /// steps, the last of which is terminal.
    fn rollout_error(
        &self,
        emulator: &TansigNetwork,
        regulator: &TansigNetwork,
        initial_state: &Array1<f64>,
        horizon: usize,
    ) -> f64;
}

/// Initial state plus the plant that drives it.
pub struct TrainingProcess {
    initial_state: Array1<f64>,
    plant: Arc<dyn Plant>,
    length: AtomicUsize,
}

impl TrainingProcess {
    pub fn new(initial_state: Array1<f64>, plant: Arc<dyn Plant>) -> Self {
        TrainingProcess {
            initial_state,
            plant,
            length: AtomicUsize::new(0),
        }
    }

    pub fn initial_state(&self) -> &Array1<f64> {
        &self.initial_state
    }

    pub fn plant(&self) -> &dyn Plant {
        self.plant.as_ref()
    }

    /// Step count of the last differentiated rollout (0 before any).
    pub fn length(&self) -> usize {
        self.length.load(Ordering::Relaxed)
    }

    pub fn set_length(&self, steps: usize) {
        self.length.store(steps, Ordering::Relaxed);
    }

    /// Rollout error over the realized length, or until termination when no
    /// rollout has been differentiated yet.
    pub fn error(&self, emulator: &TansigNetwork, regulator: &TansigNetwork) -> f64 {
        self.plant
            .rollout_error(emulator, regulator, &self.initial_state, self.length())
    }
}

impl fmt::Debug for TrainingProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingProcess")
            .field("initial_state", &self.initial_state)
            .field("length", &self.length())
            .finish_non_exhaustive()
    }
}

/// Differentiate one rollout with respect to the regulator's parameters.
///
/// Returns `transient_mean + terminal` and leaves the matching gradient in
/// `gradient`. The plant is responsible for dividing the accumulated
/// transient gradient by the step count at the terminal step.
pub fn process_gradient(
    regulator: &TansigNetwork,
    emulator: &TansigNetwork,
    process: &TrainingProcess,
    gradient: &mut Array1<f64>,
) -> f64 {
    let p = regulator.param_count();
    assert_eq!(gradient.len(), p, "gradient length mismatch");
    gradient.fill(0.0);

    let mut regulator_jacobians = LayerJacobians::new(regulator, p);
    let mut emulator_jacobians = LayerJacobians::new(emulator, p);
    let mut state = process.initial_state().clone();
    let mut next = Array1::zeros(state.len());
    let mut global = Array2::zeros((state.len(), p));

    let mut transient = 0.0;
    let mut terminal = 0.0;
    let mut steps = 0;
    let mut finished = false;
    while !finished && steps < ROLLOUT_STEP_CAP {
        let outcome = process.plant().step(&mut StepContext {
            emulator,
            regulator,
            current_state: &state,
            next_state: &mut next,
            emulator_jacobians: &mut emulator_jacobians,
            regulator_jacobians: &mut regulator_jacobians,
            global_jacobian: &mut global,
            gradient: &mut *gradient,
            iteration: steps,
            force_terminal: steps + 1 == ROLLOUT_STEP_CAP,
        });
        if outcome.finished {
            terminal = outcome.error;
        } else {
            transient += outcome.error;
        }
        finished = outcome.finished;
        std::mem::swap(&mut state, &mut next);
        steps += 1;
    }
    if !finished {
        warn!(steps, "rollout hit the step cap without a terminal step");
    }

    process.set_length(steps);
    if steps > 1 {
        transient /= (steps - 1) as f64;
    }
    transient + terminal
}

/// Mean rollout error and gradient over `batch`, one rayon task per process.
pub fn process_batch_gradient<T>(
    regulator: &TansigNetwork,
    emulator: &TansigNetwork,
    batch: &[T],
    gradient: &mut Array1<f64>,
) -> NeuroResult<f64>
where
    T: Borrow<TrainingProcess> + Sync,
{
    if batch.is_empty() {
        return Err(NeuroError::Precondition(
            "rollout gradient over an empty set of processes".to_string(),
        ));
    }
    let p = regulator.param_count();
    if gradient.len() != p {
        return Err(NeuroError::Precondition(format!(
            "gradient buffer has {} entries, regulator has {p} parameters",
            gradient.len()
        )));
    }

    let accumulator = Mutex::new((0.0_f64, Array1::<f64>::zeros(p)));
    batch.par_iter().for_each(|item| {
        let regulator = regulator.clone();
        let emulator = emulator.clone();
        let mut local = Array1::zeros(p);
        let err = process_gradient(&regulator, &emulator, item.borrow(), &mut local);
        let mut acc = accumulator.lock().unwrap_or_else(PoisonError::into_inner);
        acc.0 += err;
        acc.1 += &local;
    });

    let (sum_err, sum_grad) = accumulator
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let n = batch.len() as f64;
    gradient.assign(&(sum_grad / n));
    Ok(sum_err / n)
}

/// Mean rollout error over `processes`; `0.0` for an empty set.
pub fn process_mean_error<T>(
    regulator: &TansigNetwork,
    emulator: &TansigNetwork,
    processes: &[T],
) -> f64
where
    T: Borrow<TrainingProcess> + Sync,
{
    if processes.is_empty() {
        return 0.0;
    }
    let total: f64 = processes
        .par_iter()
        .map(|item| item.borrow().error(emulator, regulator))
        .sum();
    total / processes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InitSpan;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Counter plant: state[0] += 1 per step, finishes when it reaches `stop`.
    /// Transient steps cost 1, the terminal step costs 10.
    struct Counter {
        stop: f64,
    }

    impl Plant for Counter {
        fn check(&self, _emulator: &TansigNetwork, regulator: &TansigNetwork) -> NeuroResult<()> {
            if regulator.input_count() == 1 {
                Ok(())
            } else {
                Err(NeuroError::Precondition("counter state is 1-d".to_string()))
            }
        }

        fn step(&self, ctx: &mut StepContext<'_>) -> StepOutcome {
            ctx.next_state.assign(ctx.current_state);
            ctx.next_state[0] += 1.0;
            let finished = ctx.next_state[0] >= self.stop || ctx.force_terminal;
            StepOutcome {
                error: if finished { 10.0 } else { 1.0 },
                finished,
            }
        }

        fn rollout_error(
            &self,
            _emulator: &TansigNetwork,
            _regulator: &TansigNetwork,
            initial_state: &Array1<f64>,
            horizon: usize,
        ) -> f64 {
            let steps = if horizon == 0 {
                (self.stop - initial_state[0]).ceil().max(1.0) as usize
            } else {
                horizon
            };
            if steps > 1 {
                11.0
            } else {
                10.0
            }
        }
    }

    fn nets() -> (TansigNetwork, TansigNetwork) {
        let mut rng = StdRng::seed_from_u64(4);
        let reg = TansigNetwork::random(1, &[2, 1], true, InitSpan::new(1.0, 1.0), &mut rng)
            .unwrap();
        let emu = TansigNetwork::random(2, &[3, 1], true, InitSpan::new(1.0, 1.0), &mut rng)
            .unwrap();
        (reg, emu)
    }

    #[test]
    fn test_length_and_terminal_bookkeeping() {
        let (reg, emu) = nets();
        let process = TrainingProcess::new(array![0.0], Arc::new(Counter { stop: 5.0 }));
        assert_eq!(process.length(), 0);
        let mut g = Array1::zeros(reg.param_count());
        let err = process_gradient(&reg, &emu, &process, &mut g);
        assert_eq!(process.length(), 5);
        // Four transient steps of 1 averaged, plus the terminal 10.
        assert!((err - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_step_rollout() {
        let (reg, emu) = nets();
        let process = TrainingProcess::new(array![10.0], Arc::new(Counter { stop: 5.0 }));
        let mut g = Array1::zeros(reg.param_count());
        let err = process_gradient(&reg, &emu, &process, &mut g);
        assert_eq!(process.length(), 1);
        assert_eq!(err, 10.0);
    }

    #[test]
    fn test_step_cap_forces_terminal() {
        let (reg, emu) = nets();
        let process = TrainingProcess::new(array![0.0], Arc::new(Counter { stop: f64::INFINITY }));
        let mut g = Array1::zeros(reg.param_count());
        let err = process_gradient(&reg, &emu, &process, &mut g);
        assert_eq!(process.length(), ROLLOUT_STEP_CAP);
        assert!((err - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_mean_and_empty() {
        let (reg, emu) = nets();
        let plant: Arc<dyn Plant> = Arc::new(Counter { stop: 3.0 });
        let processes = vec![
            TrainingProcess::new(array![0.0], plant.clone()),
            TrainingProcess::new(array![5.0], plant),
        ];
        let mut g = Array1::zeros(reg.param_count());
        let err = process_batch_gradient(&reg, &emu, &processes, &mut g).unwrap();
        assert!((err - (11.0 + 10.0) / 2.0).abs() < 1e-12);
        assert_eq!(processes[0].length(), 3);
        assert_eq!(processes[1].length(), 1);
        assert!((process_mean_error(&reg, &emu, &processes) - 10.5).abs() < 1e-12);

        let empty: Vec<TrainingProcess> = Vec::new();
        assert!(process_batch_gradient(&reg, &emu, &empty, &mut g).is_err());
        assert_eq!(process_mean_error(&reg, &emu, &empty), 0.0);
    }
}
