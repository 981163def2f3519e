// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Scaled-Tanh Network
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Layered feedforward network with `1.7159·tanh(2/3·net)` activations.
//!
//! The network holds parameters only. Per-layer evaluation caches live in a
//! [`ForwardTrace`] owned by the caller, so one network can be evaluated from
//! many rayon workers at once without cloning.

use crate::pair::TrainingPair;
use crate::params::ParamSlot;
use ndarray::{Array1, Array2};
use neuro_types::constants::{TANSIG_GAIN, TANSIG_SLOPE};
use neuro_types::error::{NeuroError, NeuroResult};
use rand::Rng;
use rand_distr::Uniform;

/// Scaled hyperbolic tangent.
pub fn tansig(net: f64) -> f64 {
    TANSIG_GAIN * (TANSIG_SLOPE * net).tanh()
}

/// d tansig / d net.
pub fn tansig_derivative(net: f64) -> f64 {
    let t = (TANSIG_SLOPE * net).tanh();
    TANSIG_GAIN * TANSIG_SLOPE * (1.0 - t * t)
}

/// One layer: weights (neurons × inputs) and biases (neurons,).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

impl Layer {
    pub fn neurons(&self) -> usize {
        self.weights.nrows()
    }

    pub fn fan_in(&self) -> usize {
        self.weights.ncols()
    }
}

/// Uniform initialization spans, in units of `1/sqrt(fan_in)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitSpan {
    pub weight_span: f64,
    pub bias_span: f64,
    /// Draw weights from `[0, 2·span·std]` instead of `[-span·std, span·std]`.
    pub nonnegative_weights: bool,
}

impl InitSpan {
    pub fn new(weight_span: f64, bias_span: f64) -> Self {
        InitSpan {
            weight_span,
            bias_span,
            nonnegative_weights: false,
        }
    }

    /// All-zero parameters.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Per-layer net inputs and outputs of one evaluation.
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    pub net_inputs: Vec<Array1<f64>>,
    pub outputs: Vec<Array1<f64>>,
}

impl ForwardTrace {
    /// Output of the last layer.
    pub fn output(&self) -> &Array1<f64> {
        &self.outputs[self.outputs.len() - 1]
    }

    pub fn into_output(mut self) -> Array1<f64> {
        self.outputs.pop().unwrap_or_default()
    }
}

/// Feedforward network of tansig layers, optionally with a linear output layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TansigNetwork {
    inputs: usize,
    layers: Vec<Layer>,
    purelin_output: bool,
}

impl TansigNetwork {
    /// Random Xavier-like initialization: `std = 1/sqrt(fan_in)` scaled by `span`.
    pub fn random<R: Rng>(
        inputs: usize,
        layer_sizes: &[usize],
        purelin_output: bool,
        span: InitSpan,
        rng: &mut R,
    ) -> NeuroResult<Self> {
        if inputs == 0 {
            return Err(NeuroError::ConfigError(
                "network needs at least one input".to_string(),
            ));
        }
        if layer_sizes.is_empty() || layer_sizes.contains(&0) {
            return Err(NeuroError::ConfigError(format!(
                "layer sizes must be non-empty and positive, got {layer_sizes:?}"
            )));
        }
        for (name, value) in [("weight", span.weight_span), ("bias", span.bias_span)] {
            if !value.is_finite() || value < 0.0 {
                return Err(NeuroError::ConfigError(format!(
                    "{name} span must be finite and >= 0, got {value}"
                )));
            }
        }

        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut fan_in = inputs;
        for &neurons in layer_sizes {
            let std_dev = 1.0 / (fan_in as f64).sqrt();
            let w_half = span.weight_span * std_dev;
            let b_half = span.bias_span * std_dev;
            let w_dist = if span.nonnegative_weights {
                Uniform::new_inclusive(0.0, 2.0 * w_half)
            } else {
                Uniform::new_inclusive(-w_half, w_half)
            };
            let b_dist = Uniform::new_inclusive(-b_half, b_half);

            let weights = Array2::from_shape_fn((neurons, fan_in), |_| rng.sample(w_dist));
            let biases = Array1::from_shape_fn(neurons, |_| rng.sample(b_dist));
            layers.push(Layer { weights, biases });
            fan_in = neurons;
        }

        Ok(TansigNetwork {
            inputs,
            layers,
            purelin_output,
        })
    }

    /// Build from explicit layer matrices, checking the shape chain.
    pub fn from_layers(inputs: usize, layers: Vec<Layer>, purelin_output: bool) -> NeuroResult<Self> {
        if layers.is_empty() {
            return Err(NeuroError::ConfigError(
                "network needs at least one layer".to_string(),
            ));
        }
        let mut fan_in = inputs;
        for (i, layer) in layers.iter().enumerate() {
            if layer.fan_in() != fan_in {
                return Err(NeuroError::ConfigError(format!(
                    "layer {i} expects {} inputs, previous stage provides {fan_in}",
                    layer.fan_in()
                )));
            }
            if layer.biases.len() != layer.neurons() || layer.neurons() == 0 {
                return Err(NeuroError::ConfigError(format!(
                    "layer {i} has {} weight rows but {} biases",
                    layer.neurons(),
                    layer.biases.len()
                )));
            }
            fan_in = layer.neurons();
        }
        Ok(TansigNetwork {
            inputs,
            layers,
            purelin_output,
        })
    }

    pub fn input_count(&self) -> usize {
        self.inputs
    }

    pub fn output_count(&self) -> usize {
        self.layers[self.layers.len() - 1].neurons()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::neurons).collect()
    }

    pub fn is_purelin_output(&self) -> bool {
        self.purelin_output
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Total number of weights and biases.
    pub fn param_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.neurons() * (l.fan_in() + 1))
            .sum()
    }

    /// True when layer `l` applies the tansig nonlinearity.
    pub fn is_tansig_layer(&self, l: usize) -> bool {
        l + 1 < self.layers.len() || !self.purelin_output
    }

    pub fn param(&self, slot: ParamSlot) -> f64 {
        match slot {
            ParamSlot::Weight { layer, row, col } => self.layers[layer].weights[[row, col]],
            ParamSlot::Bias { layer, row } => self.layers[layer].biases[row],
        }
    }

    pub fn param_mut(&mut self, slot: ParamSlot) -> &mut f64 {
        match slot {
            ParamSlot::Weight { layer, row, col } => &mut self.layers[layer].weights[[row, col]],
            ParamSlot::Bias { layer, row } => &mut self.layers[layer].biases[row],
        }
    }

    fn layer_activation(&self, l: usize, net: Array1<f64>) -> Array1<f64> {
        if self.is_tansig_layer(l) {
            net.mapv(tansig)
        } else {
            net
        }
    }

    /// Evaluate the network. Deterministic for fixed parameters.
    pub fn eval(&self, input: &Array1<f64>) -> Array1<f64> {
        assert_eq!(
            input.len(),
            self.inputs,
            "network expects {} inputs, got {}",
            self.inputs,
            input.len()
        );
        let mut x = self.layer_activation(0, self.layers[0].weights.dot(input) + &self.layers[0].biases);
        for (l, layer) in self.layers.iter().enumerate().skip(1) {
            x = self.layer_activation(l, layer.weights.dot(&x) + &layer.biases);
        }
        x
    }

    /// Weighted squared error of one pair: `Σ (w_i·(target_i − output_i))²`.
    pub fn squared_error(&self, pair: &TrainingPair, error_weights: Option<&Array1<f64>>) -> f64 {
        let output = self.eval(pair.input());
        weighted_squared_error(pair.target(), &output, error_weights)
    }

    /// Evaluate and keep every layer's net input and output.
    pub fn forward(&self, input: &Array1<f64>) -> ForwardTrace {
        assert_eq!(
            input.len(),
            self.inputs,
            "network expects {} inputs, got {}",
            self.inputs,
            input.len()
        );
        let mut net_inputs: Vec<Array1<f64>> = Vec::with_capacity(self.layers.len());
        let mut outputs: Vec<Array1<f64>> = Vec::with_capacity(self.layers.len());
        for (l, layer) in self.layers.iter().enumerate() {
            let x = if l == 0 { input } else { &outputs[l - 1] };
            let net = layer.weights.dot(x) + &layer.biases;
            let out = self.layer_activation(l, net.clone());
            net_inputs.push(net);
            outputs.push(out);
        }
        ForwardTrace {
            net_inputs,
            outputs,
        }
    }
}

pub(crate) fn weighted_squared_error(
    target: &Array1<f64>,
    output: &Array1<f64>,
    error_weights: Option<&Array1<f64>>,
) -> f64 {
    assert_eq!(target.len(), output.len(), "target/output dimension mismatch");
    target
        .iter()
        .zip(output.iter())
        .enumerate()
        .map(|(i, (t, o))| {
            let e = error_weights.map_or(1.0, |w| w[i]) * (t - o);
            e * e
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny() -> TansigNetwork {
        let layers = vec![
            Layer {
                weights: array![[0.5, -1.0], [0.25, 0.75]],
                biases: array![0.1, -0.2],
            },
            Layer {
                weights: array![[1.0, -0.5]],
                biases: array![0.3],
            },
        ];
        TansigNetwork::from_layers(2, layers, true).unwrap()
    }

    #[test]
    fn test_tansig_shape() {
        assert_eq!(tansig(0.0), 0.0);
        assert!((tansig(100.0) - TANSIG_GAIN).abs() < 1e-12);
        // Designed so that f(±1) = ±1.
        assert!((tansig(1.0) - 1.0).abs() < 1e-4);
        assert!((tansig_derivative(0.0) - TANSIG_GAIN * TANSIG_SLOPE).abs() < 1e-15);
    }

    #[test]
    fn test_tansig_derivative_matches_fd() {
        for &x in &[-2.0, -0.3, 0.0, 0.7, 3.0] {
            let h = 1e-6;
            let fd = (tansig(x + h) - tansig(x - h)) / (2.0 * h);
            assert!((fd - tansig_derivative(x)).abs() < 1e-8, "x={x}");
        }
    }

    #[test]
    fn test_eval_by_hand() {
        let net = tiny();
        let x = array![1.0, 2.0];
        let h0 = tansig(0.5 - 2.0 + 0.1);
        let h1 = tansig(0.25 + 1.5 - 0.2);
        let expected = h0 - 0.5 * h1 + 0.3;
        let out = net.eval(&x);
        assert_eq!(out.len(), 1);
        assert!((out[0] - expected).abs() < 1e-14);
    }

    #[test]
    fn test_forward_matches_eval() {
        let net = tiny();
        let x = array![-0.4, 0.9];
        let trace = net.forward(&x);
        assert_eq!(trace.net_inputs.len(), 2);
        assert_eq!(trace.output(), &net.eval(&x));
        assert_eq!(trace.outputs[0], trace.net_inputs[0].mapv(tansig));
        // Linear output layer.
        assert_eq!(trace.outputs[1], trace.net_inputs[1]);
    }

    #[test]
    fn test_tansig_output_layer_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = TansigNetwork::random(3, &[4, 2], false, InitSpan::new(5.0, 5.0), &mut rng)
            .unwrap();
        let out = net.eval(&array![10.0, -10.0, 3.0]);
        assert!(out.iter().all(|v| v.abs() <= TANSIG_GAIN));
    }

    #[test]
    fn test_random_respects_spans() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = TansigNetwork::random(4, &[8, 3], true, InitSpan::new(1.0, 0.5), &mut rng)
            .unwrap();
        assert_eq!(net.layer_sizes(), vec![8, 3]);
        assert_eq!(net.param_count(), 8 * 5 + 3 * 9);
        let bound0 = 1.0 / 2.0;
        assert!(net.layers()[0].weights.iter().all(|w| w.abs() <= bound0));
        assert!(net.layers()[0].biases.iter().all(|b| b.abs() <= 0.5 * bound0));
        let bound1 = 1.0 / 8.0_f64.sqrt();
        assert!(net.layers()[1].weights.iter().all(|w| w.abs() <= bound1 + 1e-15));
    }

    #[test]
    fn test_nonnegative_weights() {
        let mut rng = StdRng::seed_from_u64(5);
        let span = InitSpan {
            nonnegative_weights: true,
            ..InitSpan::new(1.0, 1.0)
        };
        let net = TansigNetwork::random(9, &[6, 1], true, span, &mut rng).unwrap();
        for layer in net.layers() {
            assert!(layer.weights.iter().all(|&w| w >= 0.0));
        }
        let bound = 2.0 / 3.0;
        assert!(net.layers()[0].weights.iter().all(|&w| w <= bound));
    }

    #[test]
    fn test_zero_span_gives_zero_params() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = TansigNetwork::random(2, &[3, 1], true, InitSpan::zero(), &mut rng).unwrap();
        assert!(net.layers().iter().all(|l| l.weights.iter().all(|&w| w == 0.0)));
        assert_eq!(net.eval(&array![1.0, -1.0])[0], 0.0);
    }

    #[test]
    fn test_clone_is_deep_and_identical() {
        let mut rng = StdRng::seed_from_u64(21);
        let net = TansigNetwork::random(3, &[5, 2], true, InitSpan::new(1.0, 1.0), &mut rng)
            .unwrap();
        let mut copy = net.clone();
        let x = array![0.3, -0.2, 0.9];
        assert_eq!(net.eval(&x), copy.eval(&x));
        *copy.param_mut(ParamSlot::Bias { layer: 1, row: 0 }) += 1.0;
        assert_ne!(net.eval(&x)[0], copy.eval(&x)[0]);
    }

    #[test]
    fn test_from_layers_rejects_broken_chain() {
        let layers = vec![
            Layer {
                weights: Array2::zeros((3, 2)),
                biases: Array1::zeros(3),
            },
            Layer {
                weights: Array2::zeros((1, 4)),
                biases: Array1::zeros(1),
            },
        ];
        assert!(TansigNetwork::from_layers(2, layers, true).is_err());
        assert!(TansigNetwork::from_layers(2, Vec::new(), true).is_err());
    }

    #[test]
    fn test_random_rejects_bad_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(TansigNetwork::random(0, &[3], true, InitSpan::zero(), &mut rng).is_err());
        assert!(TansigNetwork::random(2, &[], true, InitSpan::zero(), &mut rng).is_err());
        assert!(TansigNetwork::random(2, &[3, 0], true, InitSpan::zero(), &mut rng).is_err());
        assert!(
            TansigNetwork::random(2, &[3], true, InitSpan::new(-1.0, 0.0), &mut rng).is_err()
        );
    }

    #[test]
    #[should_panic(expected = "network expects 2 inputs")]
    fn test_eval_wrong_dimension_panics() {
        tiny().eval(&array![1.0]);
    }
}
