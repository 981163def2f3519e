// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::INITIAL_LEARNING_STEP;
use crate::error::{NeuroError, NeuroResult};
use serde::{Deserialize, Serialize};

/// Top-level training configuration, one JSON document per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub network: NetworkConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conjugate_gradient: Option<ConjugateGradientConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stochastic: Option<StochasticConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swarm: Option<SwarmConfig>,
}

impl TrainingConfig {
    /// Load from a JSON file and validate every present section.
    pub fn from_file(path: &str) -> NeuroResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NeuroResult<()> {
        self.network.validate()?;
        if let Some(cg) = &self.conjugate_gradient {
            cg.validate()?;
        }
        if let Some(sgd) = &self.stochastic {
            sgd.validate()?;
        }
        if let Some(pso) = &self.swarm {
            pso.validate()?;
        }
        Ok(())
    }
}

/// Network shape and random-initialization spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub inputs: usize,
    pub layer_sizes: Vec<usize>,
    /// Linear last layer instead of scaled tanh.
    #[serde(default = "default_true")]
    pub purelin_output: bool,
    #[serde(default = "default_span")]
    pub weight_span: f64,
    #[serde(default = "default_span")]
    pub bias_span: f64,
    #[serde(default)]
    pub nonnegative_weights: bool,
}

impl NetworkConfig {
    pub fn validate(&self) -> NeuroResult<()> {
        if self.inputs == 0 {
            return Err(NeuroError::ConfigError(
                "network inputs must be >= 1".to_string(),
            ));
        }
        if self.layer_sizes.is_empty() || self.layer_sizes.iter().any(|&n| n == 0) {
            return Err(NeuroError::ConfigError(format!(
                "network layer sizes must be non-empty and positive, got {:?}",
                self.layer_sizes
            )));
        }
        validate_span("weight_span", self.weight_span)?;
        validate_span("bias_span", self.bias_span)
    }
}

/// Convergence, overlearning and budget limits shared by the gradient trainers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoppingConfig {
    /// Relative-improvement threshold and absolute error target.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Iterations (conjugate gradient) or epochs (stochastic).
    #[serde(default = "default_iteration_limit")]
    pub iteration_limit: usize,
    #[serde(default = "default_convergence_count_limit")]
    pub convergence_count_limit: usize,
    #[serde(default = "default_overlearning_count_limit")]
    pub overlearning_count_limit: usize,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        StoppingConfig {
            epsilon: default_epsilon(),
            iteration_limit: default_iteration_limit(),
            convergence_count_limit: default_convergence_count_limit(),
            overlearning_count_limit: default_overlearning_count_limit(),
        }
    }
}

impl StoppingConfig {
    pub fn validate(&self) -> NeuroResult<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(NeuroError::ConfigError(
                "stopping epsilon must be finite and >= 0".to_string(),
            ));
        }
        if self.iteration_limit == 0 {
            return Err(NeuroError::ConfigError(
                "stopping iteration_limit must be >= 1".to_string(),
            ));
        }
        if self.convergence_count_limit == 0 || self.overlearning_count_limit == 0 {
            return Err(NeuroError::ConfigError(
                "stopping count limits must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConjugateGradientConfig {
    #[serde(flatten)]
    pub stopping: StoppingConfig,
    /// Starting line-search baseline.
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,
    /// Upper bound on line-search trials per iteration.
    #[serde(default = "default_line_search_trials")]
    pub max_line_search_trials: usize,
}

impl Default for ConjugateGradientConfig {
    fn default() -> Self {
        ConjugateGradientConfig {
            stopping: StoppingConfig::default(),
            initial_step: default_initial_step(),
            max_line_search_trials: default_line_search_trials(),
        }
    }
}

impl ConjugateGradientConfig {
    /// Defaults used for rollout training, where line searches run longer.
    pub fn for_processes() -> Self {
        ConjugateGradientConfig {
            max_line_search_trials: 200,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> NeuroResult<()> {
        self.stopping.validate()?;
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return Err(NeuroError::ConfigError(
                "conjugate gradient initial_step must be finite and > 0".to_string(),
            ));
        }
        if self.max_line_search_trials == 0 {
            return Err(NeuroError::ConfigError(
                "conjugate gradient max_line_search_trials must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How the stochastic trainer selects the next sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PickOrder {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticConfig {
    #[serde(flatten)]
    pub stopping: StoppingConfig,
    pub initial_rate: f64,
    #[serde(default = "default_rate_increase")]
    pub rate_increase: f64,
    #[serde(default = "default_rate_decrease")]
    pub rate_decrease: f64,
    #[serde(default = "default_minibatch")]
    pub minibatch: usize,
    #[serde(default)]
    pub pick_order: PickOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl StochasticConfig {
    pub fn new(initial_rate: f64) -> Self {
        StochasticConfig {
            stopping: StoppingConfig::default(),
            initial_rate,
            rate_increase: default_rate_increase(),
            rate_decrease: default_rate_decrease(),
            minibatch: default_minibatch(),
            pick_order: PickOrder::Random,
            seed: None,
        }
    }

    /// Rollout training walks the processes in order.
    pub fn for_processes(initial_rate: f64) -> Self {
        StochasticConfig {
            pick_order: PickOrder::Sequential,
            ..Self::new(initial_rate)
        }
    }

    pub fn validate(&self) -> NeuroResult<()> {
        self.stopping.validate()?;
        if !self.initial_rate.is_finite() || self.initial_rate <= 0.0 {
            return Err(NeuroError::ConfigError(
                "stochastic initial_rate must be finite and > 0".to_string(),
            ));
        }
        if !self.rate_increase.is_finite() || self.rate_increase < 1.0 {
            return Err(NeuroError::ConfigError(
                "stochastic rate_increase must be finite and >= 1".to_string(),
            ));
        }
        if !self.rate_decrease.is_finite() || self.rate_decrease <= 0.0 || self.rate_decrease > 1.0
        {
            return Err(NeuroError::ConfigError(
                "stochastic rate_decrease must lie in (0, 1]".to_string(),
            ));
        }
        if self.minibatch == 0 {
            return Err(NeuroError::ConfigError(
                "stochastic minibatch must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Particle-swarm hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    pub particle_count: usize,
    #[serde(default = "default_swarm_iterations")]
    pub iteration_limit: usize,
    #[serde(default = "default_inertia")]
    pub inertia: f64,
    #[serde(default = "default_acceleration")]
    pub c1: f64,
    #[serde(default = "default_acceleration")]
    pub c2: f64,
    pub max_velocity: f64,
    #[serde(default = "default_span")]
    pub weight_span: f64,
    #[serde(default = "default_span")]
    pub bias_span: f64,
    /// Seed the swarm from the hosted network instead of a fresh random start.
    #[serde(default)]
    pub keep_training: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SwarmConfig {
    pub fn new(particle_count: usize, max_velocity: f64) -> Self {
        SwarmConfig {
            particle_count,
            iteration_limit: default_swarm_iterations(),
            inertia: default_inertia(),
            c1: default_acceleration(),
            c2: default_acceleration(),
            max_velocity,
            weight_span: default_span(),
            bias_span: default_span(),
            keep_training: false,
            seed: None,
        }
    }

    pub fn validate(&self) -> NeuroResult<()> {
        if self.particle_count == 0 {
            return Err(NeuroError::ConfigError(
                "swarm particle_count must be >= 1".to_string(),
            ));
        }
        if !self.max_velocity.is_finite() || self.max_velocity <= 0.0 {
            return Err(NeuroError::ConfigError(
                "swarm max_velocity must be finite and > 0".to_string(),
            ));
        }
        for (name, value) in [("inertia", self.inertia), ("c1", self.c1), ("c2", self.c2)] {
            if !value.is_finite() {
                return Err(NeuroError::ConfigError(format!(
                    "swarm {name} must be finite"
                )));
            }
        }
        validate_span("swarm weight_span", self.weight_span)?;
        validate_span("swarm bias_span", self.bias_span)
    }
}

fn validate_span(name: &str, value: f64) -> NeuroResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(NeuroError::ConfigError(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}
fn default_span() -> f64 {
    1.0
}
fn default_epsilon() -> f64 {
    1e-10
}
fn default_iteration_limit() -> usize {
    100_000
}
fn default_convergence_count_limit() -> usize {
    100
}
fn default_overlearning_count_limit() -> usize {
    50
}
fn default_initial_step() -> f64 {
    INITIAL_LEARNING_STEP
}
fn default_line_search_trials() -> usize {
    50
}
fn default_rate_increase() -> f64 {
    1.0
}
fn default_rate_decrease() -> f64 {
    1.0
}
fn default_minibatch() -> usize {
    1
}
fn default_swarm_iterations() -> usize {
    50
}
fn default_inertia() -> f64 {
    0.7
}
fn default_acceleration() -> f64 {
    1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_gets_defaults() {
        let json = r#"{
            "network": { "inputs": 1, "layer_sizes": [5, 1] },
            "conjugate_gradient": { "iteration_limit": 500 }
        }"#;
        let cfg: TrainingConfig = serde_json::from_str(json).unwrap();
        assert!(cfg.network.purelin_output);
        assert_eq!(cfg.network.weight_span, 1.0);
        let cg = cfg.conjugate_gradient.unwrap();
        assert_eq!(cg.stopping.iteration_limit, 500);
        assert_eq!(cg.stopping.convergence_count_limit, 100);
        assert!((cg.initial_step - 1e-3).abs() < 1e-18);
        assert!(cfg.stochastic.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_pick_order_snake_case() {
        let json = r#"{ "initial_rate": 0.1, "pick_order": "sequential" }"#;
        let cfg: StochasticConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.pick_order, PickOrder::Sequential);
        assert_eq!(cfg.minibatch, 1);
    }

    #[test]
    fn test_rejects_zero_layer() {
        let cfg = NetworkConfig {
            inputs: 2,
            layer_sizes: vec![3, 0],
            purelin_output: true,
            weight_span: 1.0,
            bias_span: 1.0,
            nonnegative_weights: false,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_rates() {
        let mut cfg = StochasticConfig::new(0.1);
        cfg.rate_decrease = 1.5;
        assert!(cfg.validate().is_err());
        cfg.rate_decrease = 0.5;
        cfg.initial_rate = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_swarm() {
        assert!(SwarmConfig::new(0, 0.1).validate().is_err());
        assert!(SwarmConfig::new(4, 0.0).validate().is_err());
        SwarmConfig::new(4, 0.1).validate().unwrap();
    }

    #[test]
    fn test_process_defaults_extend_line_search() {
        let cfg = ConjugateGradientConfig::for_processes();
        assert_eq!(cfg.max_line_search_trials, 200);
        cfg.validate().unwrap();
        let sgd = StochasticConfig::for_processes(0.01);
        assert_eq!(sgd.pick_order, PickOrder::Sequential);
        sgd.validate().unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TrainingConfig::from_file("/nonexistent/neuro_config.json").unwrap_err();
        assert!(matches!(err, NeuroError::Io(_)));
    }
}
