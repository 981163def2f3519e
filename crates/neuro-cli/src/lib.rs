// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — CLI Commands
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Command bodies behind the `neuro` binary.

use ndarray::{array, Array1};
use neuro_core::network::{InitSpan, TansigNetwork};
use neuro_core::pair::TrainingPair;
use neuro_train::conjugate::ConjugateGradientTrainer;
use neuro_train::objective::PairObjective;
use neuro_train::progress::{ProgressReport, TrainingSummary};
use neuro_train::stochastic::StochasticTrainer;
use neuro_train::swarm::SwarmTrainer;
use neuro_types::config::{ConjugateGradientConfig, NetworkConfig, TrainingConfig};
use neuro_types::error::{NeuroError, NeuroResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Training, generalization and validation sample counts of the sine demo.
pub const SINE_SAMPLES: (usize, usize, usize) = (100, 40, 40);

/// Evenly spaced samples of sin(5x) on [-1, 1], offset by `shift` of a cell.
pub fn sine_samples(count: usize, shift: f64) -> Vec<TrainingPair> {
    (0..count)
        .map(|k| {
            let x = -1.0 + 2.0 * (k as f64 + shift) / count as f64;
            TrainingPair::new(array![x], array![(5.0 * x).sin()])
        })
        .collect()
}

/// 1-`hidden`-1 purelin network trained by conjugate gradient.
pub fn default_sine_config(hidden: usize) -> TrainingConfig {
    let mut cg = ConjugateGradientConfig::default();
    cg.stopping.iteration_limit = 2000;
    TrainingConfig {
        network: NetworkConfig {
            inputs: 1,
            layer_sizes: vec![hidden, 1],
            purelin_output: true,
            weight_span: 1.0,
            bias_span: 1.0,
            nonnegative_weights: false,
        },
        conjugate_gradient: Some(cg),
        stochastic: None,
        swarm: None,
    }
}

/// Parse a comma-separated list of numbers.
pub fn parse_input(text: &str) -> NeuroResult<Array1<f64>> {
    text.split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<f64>()
                .map_err(|_| NeuroError::Precondition(format!("'{item}' is not a number")))
        })
        .collect::<NeuroResult<Vec<f64>>>()
        .map(Array1::from)
}

/// Build the network described by `config` and run every configured
/// trainer in turn: swarm, then stochastic, then conjugate gradient.
/// Returns the network and the last summary.
pub fn fit_sine(
    config: &TrainingConfig,
    seed: u64,
    cancel: &AtomicBool,
) -> NeuroResult<(TansigNetwork, TrainingSummary)> {
    config.validate()?;
    let net_cfg = &config.network;
    if net_cfg.inputs != 1 || net_cfg.layer_sizes.last() != Some(&1) {
        return Err(NeuroError::ConfigError(
            "sine fit needs a network with one input and one output".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let span = InitSpan {
        nonnegative_weights: net_cfg.nonnegative_weights,
        ..InitSpan::new(net_cfg.weight_span, net_cfg.bias_span)
    };
    let mut net = TansigNetwork::random(
        net_cfg.inputs,
        &net_cfg.layer_sizes,
        net_cfg.purelin_output,
        span,
        &mut rng,
    )?;

    let (n_train, n_gen, n_val) = SINE_SAMPLES;
    let training = sine_samples(n_train, 0.0);
    let generalization = sine_samples(n_gen, 0.25);
    let validation = sine_samples(n_val, 0.75);
    let objective = PairObjective::new(&training).with_monitoring(&generalization, &validation);

    let mut summary = None;
    if let Some(swarm) = config.swarm {
        let trainer = SwarmTrainer::new(swarm);
        summary = Some(trainer.train(&mut net, &objective, cancel, log_progress)?);
    }
    if let Some(sgd) = config.stochastic {
        let trainer = StochasticTrainer::new(sgd);
        summary = Some(trainer.train(&mut net, &objective, cancel, log_progress)?);
    }
    let cg = match (config.conjugate_gradient, summary) {
        (Some(cg), _) => Some(cg),
        (None, None) => Some(ConjugateGradientConfig::default()),
        (None, Some(_)) => None,
    };
    if let Some(cg) = cg {
        let trainer = ConjugateGradientTrainer::new(cg);
        summary = Some(trainer.train(&mut net, &objective, cancel, log_progress)?);
    }
    let summary = summary.ok_or_else(|| NeuroError::ConfigError("no trainer ran".to_string()))?;
    Ok((net, summary))
}

fn log_progress(report: ProgressReport) {
    if report.index % 100 == 0 {
        info!(
            index = report.index,
            training = report.training_error,
            generalization = report.generalization_error,
            validation = report.validation_error,
            "progress"
        );
    }
}

/// JSON summary printed after a fit.
pub fn summary_json(summary: &TrainingSummary) -> serde_json::Value {
    serde_json::json!({
        "iterations": summary.iterations,
        "training_error": summary.training_error,
        "generalization_error": summary.generalization_error,
        "validation_error": summary.validation_error,
        "stop_reason": format!("{:?}", summary.stop_reason),
    })
}

/// JSON description of a network's shape.
pub fn describe_network(net: &TansigNetwork) -> serde_json::Value {
    serde_json::json!({
        "inputs": net.input_count(),
        "layer_sizes": net.layer_sizes(),
        "purelin_output": net.is_purelin_output(),
        "param_count": net.param_count(),
    })
}

/// Evaluate `net` on a comma-separated input, checking its length.
pub fn eval_text(net: &TansigNetwork, text: &str) -> NeuroResult<Array1<f64>> {
    let input = parse_input(text)?;
    if input.len() != net.input_count() {
        return Err(NeuroError::Precondition(format!(
            "network expects {} inputs, got {}",
            net.input_count(),
            input.len()
        )));
    }
    Ok(net.eval(&input))
}
