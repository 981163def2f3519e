// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Stopping Policy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Convergence and overlearning counters shared by the gradient trainers.

use crate::progress::StopReason;
use neuro_types::config::StoppingConfig;

#[derive(Debug, Clone)]
pub struct StoppingPolicy {
    config: StoppingConfig,
    convergence_count: usize,
    overlearning_count: usize,
    best_generalization: f64,
}

impl StoppingPolicy {
    pub fn new(config: StoppingConfig, initial_generalization: f64) -> Self {
        StoppingPolicy {
            config,
            convergence_count: 0,
            overlearning_count: 0,
            best_generalization: initial_generalization,
        }
    }

    /// Count consecutive iterations whose relative improvement is below epsilon.
    pub fn record_change(&mut self, previous_error: f64, new_error: f64) {
        let relative = if previous_error > 0.0 {
            ((new_error - previous_error) / previous_error).abs()
        } else {
            0.0
        };
        if relative < self.config.epsilon {
            self.convergence_count += 1;
        } else {
            self.convergence_count = 0;
        }
    }

    /// Count consecutive successful iterations that fail to beat the best
    /// generalization error seen so far.
    pub fn record_generalization(&mut self, generalization_error: f64) {
        if generalization_error > self.best_generalization {
            self.overlearning_count += 1;
        } else {
            self.overlearning_count = 0;
        }
        self.best_generalization = self.best_generalization.min(generalization_error);
    }

    pub fn best_generalization(&self) -> f64 {
        self.best_generalization
    }

    /// `None` while training should continue.
    pub fn stop_reason(&self, iteration: usize, error: f64, cancelled: bool) -> Option<StopReason> {
        if cancelled {
            Some(StopReason::Cancelled)
        } else if self.convergence_count >= self.config.convergence_count_limit {
            Some(StopReason::Converged)
        } else if self.overlearning_count >= self.config.overlearning_count_limit {
            Some(StopReason::Overlearning)
        } else if iteration >= self.config.iteration_limit {
            Some(StopReason::IterationLimit)
        } else if error <= self.config.epsilon {
            Some(StopReason::ErrorTarget)
        } else {
            None
        }
    }
}
