// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Particle-Swarm Trainer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Gradient-free training by particle-swarm optimization.
//!
//! Each particle owns a full network clone, so fitness evaluation fans out
//! with `par_iter_mut` without sharing mutable state.

use crate::objective::Objective;
use crate::progress::{is_cancelled, ProgressReport, StopReason, TrainingSummary};
use ndarray::{Array1, Zip};
use neuro_core::network::{InitSpan, TansigNetwork};
use neuro_core::params::{add_to_params, flatten, unflatten_into};
use neuro_types::config::SwarmConfig;
use neuro_types::error::{NeuroError, NeuroResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Particle {
    net: TansigNetwork,
    velocity: Array1<f64>,
    error: f64,
    best_position: Array1<f64>,
    best_error: f64,
}

impl Particle {
    /// Keep the current position if it beats the personal best.
    fn update_best(&mut self) -> bool {
        if self.error < self.best_error {
            self.best_error = self.error;
            self.best_position = flatten(&self.net);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwarmTrainer {
    config: SwarmConfig,
}

impl SwarmTrainer {
    pub fn new(config: SwarmConfig) -> Self {
        SwarmTrainer { config }
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Run the swarm for `iteration_limit` iterations; `net` ends holding the
    /// global best.
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
        if cfg.particle_count == 0 {
            return Err(NeuroError::Precondition(
                "particle swarm needs at least one particle".to_string(),
            ));
        }
        cfg.validate()?;
        objective.check(net)?;
        objective.reset_horizons();
        if objective.training_len() == 0 {
            return Err(NeuroError::Precondition(
                "particle swarm needs a non-empty training set".to_string(),
            ));
        }

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let p = net.param_count();
        let mut particles = self.spawn(net, &mut rng)?;

        particles.par_iter_mut().for_each(|pt| {
            pt.error = objective.training_error(&pt.net);
            pt.best_error = pt.error;
        });

        let (mut best_index, mut best_error) = swarm_best(&particles);
        let mut global_best = particles[best_index].best_position.clone();
        unflatten_into(net, &global_best);
        let mut generalization = objective.generalization_error(net);
        let mut validation = objective.validation_error(net);
        progress(ProgressReport {
            index: 0,
            training_error: best_error,
            generalization_error: generalization,
            validation_error: validation,
        });
        info!(
            particles = cfg.particle_count,
            params = p,
            error = best_error,
            "particle swarm started"
        );

        let mut iteration = 0_usize;
        let stop_reason = loop {
            if iteration >= cfg.iteration_limit {
                break StopReason::IterationLimit;
            }
            if is_cancelled(cancel) {
                break StopReason::Cancelled;
            }

            let r1 = Array1::from_shape_fn(p, |_| rng.gen::<f64>());
            let r2 = Array1::from_shape_fn(p, |_| rng.gen::<f64>());
            particles.par_iter_mut().for_each(|pt| {
                let position = flatten(&pt.net);
                Zip::from(&mut pt.velocity)
                    .and(&position)
                    .and(&pt.best_position)
                    .and(&global_best)
                    .and(&r1)
                    .and(&r2)
                    .for_each(|v, &x, &pb, &gb, &a, &b| {
                        *v = cfg.inertia * *v + cfg.c1 * a * (pb - x) + cfg.c2 * b * (gb - x);
                    });
                let largest = pt.velocity.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
                if largest > cfg.max_velocity {
                    pt.velocity *= cfg.max_velocity / largest;
                }
                add_to_params(&mut pt.net, &pt.velocity);
                pt.error = objective.training_error(&pt.net);
                pt.update_best();
            });

            iteration += 1;
            let (index, error) = swarm_best(&particles);
            if error < best_error {
                best_index = index;
                best_error = error;
                global_best.assign(&particles[best_index].best_position);
                unflatten_into(net, &global_best);
                generalization = objective.generalization_error(net);
                validation = objective.validation_error(net);
            }
            progress(ProgressReport {
                index: iteration,
                training_error: best_error,
                generalization_error: generalization,
                validation_error: validation,
            });
            debug!(iteration, error = best_error, particle = best_index, "swarm iteration");
        };

        info!(iteration, error = best_error, reason = ?stop_reason, "particle swarm stopped");
        Ok(TrainingSummary {
            iterations: iteration,
            training_error: best_error,
            generalization_error: generalization,
            validation_error: validation,
            stop_reason,
        })
    }

    fn spawn(&self, net: &TansigNetwork, rng: &mut StdRng) -> NeuroResult<Vec<Particle>> {
        let cfg = &self.config;
        let span = InitSpan::new(cfg.weight_span, cfg.bias_span);
        let sizes = net.layer_sizes();
        let p = net.param_count();
        let mut particles = Vec::with_capacity(cfg.particle_count);
        for k in 0..cfg.particle_count {
            let fresh = TansigNetwork::random(
                net.input_count(),
                &sizes,
                net.is_purelin_output(),
                span,
                rng,
            )?;
            let particle_net = match (cfg.keep_training, k) {
                (true, 0) => net.clone(),
                (true, _) => {
                    let mut perturbed = net.clone();
                    add_to_params(&mut perturbed, &flatten(&fresh));
                    perturbed
                }
                (false, _) => fresh,
            };
            let velocity = Array1::from_shape_fn(p, |_| rng.gen_range(0.0..cfg.max_velocity));
            particles.push(Particle {
                best_position: flatten(&particle_net),
                net: particle_net,
                velocity,
                error: f64::INFINITY,
                best_error: f64::INFINITY,
            });
        }
        Ok(particles)
    }
}

/// Index and error of the best personal best; the first wins ties.
fn swarm_best(particles: &[Particle]) -> (usize, f64) {
    particles
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(bi, be), (i, pt)| {
            if pt.best_error < be {
                (i, pt.best_error)
            } else {
                (bi, be)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::PairObjective;
    use ndarray::array;
    use neuro_core::pair::TrainingPair;
    use std::sync::atomic::Ordering;

    fn pairs() -> Vec<TrainingPair> {
        (0..25)
            .map(|k| {
                let x = k as f64 / 24.0 * 2.0 - 1.0;
                TrainingPair::new(array![x], array![0.5 * x])
            })
            .collect()
    }

    fn network(seed: u64) -> TansigNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        TansigNetwork::random(1, &[3, 1], true, InitSpan::new(1.0, 1.0), &mut rng).unwrap()
    }

    fn config(particles: usize, iterations: usize) -> SwarmConfig {
        let mut cfg = SwarmConfig::new(particles, 0.1);
        cfg.iteration_limit = iterations;
        cfg.seed = Some(42);
        cfg
    }

    #[test]
    fn test_global_best_never_increases() {
        let data = pairs();
        let objective = PairObjective::new(&data);
        let mut net = network(1);
        let cancel = AtomicBool::new(false);
        let mut reports = Vec::new();
        let summary = SwarmTrainer::new(config(12, 30))
            .train(&mut net, &objective, &cancel, |r| reports.push(r))
            .unwrap();

        assert_eq!(reports.len(), 31);
        for w in reports.windows(2) {
            assert!(w[1].training_error <= w[0].training_error);
        }
        assert_eq!(summary.stop_reason, StopReason::IterationLimit);
        assert!((objective.training_error(&net) - summary.training_error).abs() < 1e-12);
    }

    #[test]
    fn test_keep_training_starts_no_worse() {
        let data = pairs();
        let objective = PairObjective::new(&data);
        let mut net = network(3);
        let before = objective.training_error(&net);
        let cancel = AtomicBool::new(false);
        let mut cfg = config(6, 5);
        cfg.keep_training = true;
        cfg.weight_span = 0.1;
        cfg.bias_span = 0.1;
        let mut first = None;
        SwarmTrainer::new(cfg)
            .train(&mut net, &objective, &cancel, |r| {
                first.get_or_insert(r.training_error);
            })
            .unwrap();
        let first = first.unwrap();
        assert!(first <= before + 1e-12);
        assert!(objective.training_error(&net) <= before + 1e-12);
    }

    #[test]
    fn test_initial_velocity_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = network(2);
        let trainer = SwarmTrainer::new(config(3, 1));
        let particles = trainer.spawn(&net, &mut rng).unwrap();
        for pt in &particles {
            assert!(pt.velocity.iter().all(|&v| (0.0..0.1).contains(&v)));
        }
    }

    #[test]
    fn test_zero_particles_is_precondition() {
        let data = pairs();
        let mut net = network(1);
        let cancel = AtomicBool::new(false);
        let result = SwarmTrainer::new(config(0, 5)).train(
            &mut net,
            &PairObjective::new(&data),
            &cancel,
            |_| {},
        );
        assert!(matches!(result, Err(NeuroError::Precondition(_))));
    }

    #[test]
    fn test_cancel_before_first_iteration() {
        let data = pairs();
        let mut net = network(1);
        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::Relaxed);
        let summary = SwarmTrainer::new(config(4, 50))
            .train(&mut net, &PairObjective::new(&data), &cancel, |_| {})
            .unwrap();
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
    }
}
