// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Stochastic Trainer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-sample (or per-minibatch) descent with an adaptive learning rate.
//!
//! A pick is accepted only when it lowers the error of the samples it was
//! computed on; otherwise the parameters roll back. Full errors are measured
//! once per epoch.

use crate::objective::Objective;
use crate::progress::{is_cancelled, ProgressReport, TrainingSummary};
use crate::stopping::StoppingPolicy;
use ndarray::Array1;
use neuro_core::network::TansigNetwork;
use neuro_core::params::{descend_from, flatten, unflatten_into};
use neuro_types::config::{PickOrder, StochasticConfig};
use neuro_types::constants::{LEARNING_RATE_FLOOR, STOCHASTIC_TRIALS};
use neuro_types::error::{NeuroError, NeuroResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct StochasticTrainer {
    config: StochasticConfig,
}

impl StochasticTrainer {
    pub fn new(config: StochasticConfig) -> Self {
        StochasticTrainer { config }
    }

    pub fn config(&self) -> &StochasticConfig {
        &self.config
    }

    /// Train `net` in place, one epoch at a time.
    ///
    /// Reports index 0 before training and the epoch number after each epoch.
    /// Cancellation is polled at epoch boundaries.
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
        let cfg = &self.config;
        cfg.validate()?;
        objective.check(net)?;
        objective.reset_horizons();
        let n = objective.training_len();
        if n == 0 {
            return Err(NeuroError::Precondition(
                "stochastic training needs a non-empty training set".to_string(),
            ));
        }

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let p = net.param_count();
        let scale = 1.0 / (p as f64).sqrt();
        let trials = if cfg.rate_decrease == 1.0 { 1 } else { STOCHASTIC_TRIALS };
        let mut rate = cfg.initial_rate;

        let mut error = objective.training_error(net);
        let mut generalization = objective.generalization_error(net);
        let mut validation = objective.validation_error(net);
        progress(ProgressReport {
            index: 0,
            training_error: error,
            generalization_error: generalization,
            validation_error: validation,
        });
        info!(params = p, samples = n, error, "stochastic training started");

        let mut policy = StoppingPolicy::new(cfg.stopping, generalization);
        let mut gradient = Array1::<f64>::zeros(p);
        let mut snapshot = Array1::<f64>::zeros(p);
        let mut cursor = 0_usize;
        let mut epoch = 0_usize;

        let stop_reason = loop {
            let mut picks = 0_usize;
            let mut accepted = 0_usize;
            while picks < n {
                let start = match cfg.pick_order {
                    PickOrder::Random => rng.gen_range(0..n),
                    PickOrder::Sequential => {
                        let s = cursor;
                        cursor = (cursor + cfg.minibatch) % n;
                        s
                    }
                };
                picks += cfg.minibatch;

                let pick_error = objective.subset_gradient(net, start, cfg.minibatch, &mut gradient)?;
                snapshot.assign(&flatten(net));
                let mut improved = false;
                for _ in 0..trials {
                    descend_from(net, &snapshot, rate * scale, &gradient);
                    if objective.subset_error(net, start, cfg.minibatch) < pick_error {
                        rate *= cfg.rate_increase;
                        improved = true;
                        break;
                    }
                    rate = (rate * cfg.rate_decrease).max(LEARNING_RATE_FLOOR);
                }
                if improved {
                    accepted += 1;
                } else {
                    unflatten_into(net, &snapshot);
                }
            }

            epoch += 1;
            let previous = error;
            error = objective.training_error(net);
            generalization = objective.generalization_error(net);
            validation = objective.validation_error(net);
            progress(ProgressReport {
                index: epoch,
                training_error: error,
                generalization_error: generalization,
                validation_error: validation,
            });
            policy.record_generalization(generalization);
            policy.record_change(previous, error);
            debug!(epoch, error, rate, accepted, "stochastic epoch");

            if let Some(reason) = policy.stop_reason(epoch, error, is_cancelled(cancel)) {
                break reason;
            }
        };

        info!(epoch, error, reason = ?stop_reason, "stochastic training stopped");
        Ok(TrainingSummary {
            iterations: epoch,
            training_error: error,
            generalization_error: generalization,
            validation_error: validation,
            stop_reason,
        })
    }
}
