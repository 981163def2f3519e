// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Conjugate-Gradient Trainer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Batch conjugate-gradient descent with an adaptive line search.
//!
//! The direction restarts from the plain gradient every `param_count`
//! iterations and whenever the Fletcher–Reeves ratio is not finite.

use crate::line_search::LineSearch;
use crate::objective::Objective;
use crate::progress::{is_cancelled, ProgressReport, StopReason, TrainingSummary};
use crate::stopping::StoppingPolicy;
use ndarray::Array1;
use neuro_core::network::TansigNetwork;
use neuro_core::params::{descend_from, flatten, unflatten_into};
use neuro_types::config::ConjugateGradientConfig;
use neuro_types::error::{NeuroError, NeuroResult};
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ConjugateGradientTrainer {
    config: ConjugateGradientConfig,
}

impl ConjugateGradientTrainer {
    pub fn new(config: ConjugateGradientConfig) -> Self {
        ConjugateGradientTrainer { config }
    }

    pub fn config(&self) -> &ConjugateGradientConfig {
        &self.config
    }

    /// Train `net` in place until a stopping rule fires.
    ///
    /// `progress` receives index 0 before the first iteration and one report
    /// after every iteration that lowered the training error.
    #[tracing::instrument(skip_all)]
    pub fn train<O, F>(
        &self,
        net: &mut TansigNetwork,
        objective: &O,
        cancel: &AtomicBool,
        mut progress: F,
    ) -> NeuroResult<TrainingSummary>
    where
        O: Objective,
        F: FnMut(ProgressReport),
    {
        self.config.validate()?;
        objective.check(net)?;
        objective.reset_horizons();
        if objective.training_len() == 0 {
            return Err(NeuroError::Precondition(
                "conjugate gradient needs a non-empty training set".to_string(),
            ));
        }

        let p = net.param_count();
        let mut error = objective.training_error(net);
        let mut generalization = objective.generalization_error(net);
        let mut validation = objective.validation_error(net);
        progress(ProgressReport {
            index: 0,
            training_error: error,
            generalization_error: generalization,
            validation_error: validation,
        });
        info!(
            params = p,
            samples = objective.training_len(),
            error,
            "conjugate gradient started"
        );

        let mut policy = StoppingPolicy::new(self.config.stopping, generalization);
        let mut line = LineSearch::new(self.config.initial_step, self.config.max_line_search_trials);
        let mut gradient = Array1::<f64>::zeros(p);
        let mut previous_gradient = Array1::<f64>::zeros(p);
        let mut direction = Array1::<f64>::zeros(p);
        let mut iteration = 0_usize;

        let stop_reason = loop {
            // Rollout lengths are re-realized here, so this error is the
            // baseline the line search has to beat.
            let start_error = objective.batch_gradient(net, &mut gradient)?;

            let g_norm2 = gradient.dot(&gradient);
            let beta = g_norm2 / previous_gradient.dot(&previous_gradient);
            if iteration % p == 0 || !beta.is_finite() {
                direction.assign(&gradient);
            } else {
                direction *= beta;
                direction += &gradient;
            }
            std::mem::swap(&mut previous_gradient, &mut gradient);

            let snapshot = flatten(net);
            error = start_error;
            let outcome = line.search(start_error, |step| {
                descend_from(net, &snapshot, step, &direction);
                objective.training_error(net)
            });

            if outcome.improved {
                error = outcome.error;
                generalization = objective.generalization_error(net);
                validation = objective.validation_error(net);
                policy.record_generalization(generalization);
                progress(ProgressReport {
                    index: iteration + 1,
                    training_error: error,
                    generalization_error: generalization,
                    validation_error: validation,
                });
            } else {
                unflatten_into(net, &snapshot);
            }
            iteration += 1;
            policy.record_change(start_error, error);
            debug!(
                iteration,
                error,
                step = outcome.step,
                trials = outcome.trials,
                improved = outcome.improved,
                "conjugate gradient iteration"
            );

            if !outcome.improved && line.is_pinned() && objective.stops_on_step_underflow() {
                warn!(iteration, error, "line-search step underflow");
                break StopReason::StepUnderflow;
            }
            if let Some(reason) = policy.stop_reason(iteration, error, is_cancelled(cancel)) {
                break reason;
            }
        };

        info!(iteration, error, reason = ?stop_reason, "conjugate gradient stopped");
        Ok(TrainingSummary {
            iterations: iteration,
            training_error: error,
            generalization_error: generalization,
            validation_error: validation,
            stop_reason,
        })
    }
}
