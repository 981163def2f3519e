// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Training Objectives
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! What a trainer minimizes: mean pair error or mean rollout error.

use ndarray::Array1;
use neuro_core::batch::{batch_gradient, mean_squared_error};
use neuro_core::network::TansigNetwork;
use neuro_core::pair::TrainingPair;
use neuro_core::rollout::{process_batch_gradient, process_mean_error, TrainingProcess};
use neuro_types::error::{NeuroError, NeuroResult};

/// Error surface over a training set, with held-out monitoring sets.
///
/// Subsets are contiguous index ranges that wrap around the end of the
/// training set.
pub trait Objective: Sync {
    fn training_len(&self) -> usize;

    /// Check sample dimensions against the network being trained.
    fn check(&self, net: &TansigNetwork) -> NeuroResult<()>;

    /// Mean error and gradient over the whole training set.
    fn batch_gradient(&self, net: &TansigNetwork, gradient: &mut Array1<f64>) -> NeuroResult<f64>;

    fn training_error(&self, net: &TansigNetwork) -> f64;

    fn generalization_error(&self, net: &TansigNetwork) -> f64;

    fn validation_error(&self, net: &TansigNetwork) -> f64;

    fn subset_gradient(
        &self,
        net: &TansigNetwork,
        start: usize,
        len: usize,
        gradient: &mut Array1<f64>,
    ) -> NeuroResult<f64>;

    fn subset_error(&self, net: &TansigNetwork, start: usize, len: usize) -> f64;

    /// Forget horizons realized by earlier training runs.
    fn reset_horizons(&self) {}

    /// A failed step search at the step floor ends conjugate-gradient
    /// training instead of counting toward convergence.
    fn stops_on_step_underflow(&self) -> bool {
        false
    }
}

fn wrapping_subset<T>(items: &[T], start: usize, len: usize) -> Vec<&T> {
    let n = items.len();
    (0..len.min(n)).map(|k| &items[(start + k) % n]).collect()
}

/// Supervised pairs with optional per-output error weights.
#[derive(Debug, Clone, Copy)]
pub struct PairObjective<'a> {
    pub training: &'a [TrainingPair],
    pub generalization: &'a [TrainingPair],
    pub validation: &'a [TrainingPair],
    pub error_weights: Option<&'a Array1<f64>>,
}

impl<'a> PairObjective<'a> {
    pub fn new(training: &'a [TrainingPair]) -> Self {
        PairObjective {
            training,
            generalization: &[],
            validation: &[],
            error_weights: None,
        }
    }

    pub fn with_monitoring(mut self, generalization: &'a [TrainingPair], validation: &'a [TrainingPair]) -> Self {
        self.generalization = generalization;
        self.validation = validation;
        self
    }

    pub fn with_error_weights(mut self, weights: &'a Array1<f64>) -> Self {
        self.error_weights = Some(weights);
        self
    }
}

impl Objective for PairObjective<'_> {
    fn training_len(&self) -> usize {
        self.training.len()
    }

    fn check(&self, net: &TansigNetwork) -> NeuroResult<()> {
        if let Some(w) = self.error_weights {
            if w.len() != net.output_count() {
                return Err(NeuroError::Precondition(format!(
                    "{} error weights for {} network outputs",
                    w.len(),
                    net.output_count()
                )));
            }
        }
        let all = self
            .training
            .iter()
            .chain(self.generalization)
            .chain(self.validation);
        for (i, pair) in all.enumerate() {
            if pair.input().len() != net.input_count()
                || pair.target().len() != net.output_count()
            {
                return Err(NeuroError::Precondition(format!(
                    "pair {i} is {} → {}, network is {} → {}",
                    pair.input().len(),
                    pair.target().len(),
                    net.input_count(),
                    net.output_count()
                )));
            }
        }
        Ok(())
    }

    fn batch_gradient(&self, net: &TansigNetwork, gradient: &mut Array1<f64>) -> NeuroResult<f64> {
        batch_gradient(net, self.training, self.error_weights, gradient)
    }

    fn training_error(&self, net: &TansigNetwork) -> f64 {
        mean_squared_error(net, self.training, self.error_weights)
    }

    fn generalization_error(&self, net: &TansigNetwork) -> f64 {
        mean_squared_error(net, self.generalization, self.error_weights)
    }

    fn validation_error(&self, net: &TansigNetwork) -> f64 {
        mean_squared_error(net, self.validation, self.error_weights)
    }

    fn subset_gradient(
        &self,
        net: &TansigNetwork,
        start: usize,
        len: usize,
        gradient: &mut Array1<f64>,
    ) -> NeuroResult<f64> {
        let subset = wrapping_subset(self.training, start, len);
        batch_gradient(net, &subset, self.error_weights, gradient)
    }

    fn subset_error(&self, net: &TansigNetwork, start: usize, len: usize) -> f64 {
        let subset = wrapping_subset(self.training, start, len);
        mean_squared_error(net, &subset, self.error_weights)
    }
}

/// Closed-loop rollouts against a frozen emulator; the trained network is
/// the regulator.
#[derive(Debug, Clone, Copy)]
pub struct ProcessObjective<'a> {
    pub emulator: &'a TansigNetwork,
    pub training: &'a [TrainingProcess],
    pub generalization: &'a [TrainingProcess],
    pub validation: &'a [TrainingProcess],
}

impl<'a> ProcessObjective<'a> {
    pub fn new(emulator: &'a TansigNetwork, training: &'a [TrainingProcess]) -> Self {
        ProcessObjective {
            emulator,
            training,
            generalization: &[],
            validation: &[],
        }
    }

    pub fn with_monitoring(
        mut self,
        generalization: &'a [TrainingProcess],
        validation: &'a [TrainingProcess],
    ) -> Self {
        self.generalization = generalization;
        self.validation = validation;
        self
    }
}

impl Objective for ProcessObjective<'_> {
    fn training_len(&self) -> usize {
        self.training.len()
    }

    fn check(&self, net: &TansigNetwork) -> NeuroResult<()> {
        let all = self
            .training
            .iter()
            .chain(self.generalization)
            .chain(self.validation);
        for (i, process) in all.enumerate() {
            process.plant().check(self.emulator, net)?;
            if process.initial_state().len() != net.input_count() {
                return Err(NeuroError::Precondition(format!(
                    "process {i} has a {}-component state, regulator takes {} inputs",
                    process.initial_state().len(),
                    net.input_count()
                )));
            }
        }
        Ok(())
    }

    fn reset_horizons(&self) {
        self.training
            .iter()
            .chain(self.generalization)
            .chain(self.validation)
            .for_each(|process| process.set_length(0));
    }

    fn stops_on_step_underflow(&self) -> bool {
        true
    }

    fn batch_gradient(&self, net: &TansigNetwork, gradient: &mut Array1<f64>) -> NeuroResult<f64> {
        process_batch_gradient(net, self.emulator, self.training, gradient)
    }

    fn training_error(&self, net: &TansigNetwork) -> f64 {
        process_mean_error(net, self.emulator, self.training)
    }

    fn generalization_error(&self, net: &TansigNetwork) -> f64 {
        process_mean_error(net, self.emulator, self.generalization)
    }

    fn validation_error(&self, net: &TansigNetwork) -> f64 {
        process_mean_error(net, self.emulator, self.validation)
    }

    fn subset_gradient(
        &self,
        net: &TansigNetwork,
        start: usize,
        len: usize,
        gradient: &mut Array1<f64>,
    ) -> NeuroResult<f64> {
        let subset = wrapping_subset(self.training, start, len);
        process_batch_gradient(net, self.emulator, &subset, gradient)
    }

    fn subset_error(&self, net: &TansigNetwork, start: usize, len: usize) -> f64 {
        let subset = wrapping_subset(self.training, start, len);
        process_mean_error(net, self.emulator, &subset)
    }
}
