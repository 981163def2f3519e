// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Reverse-Mode Gradient
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Single-sample backpropagation of the weighted squared error.

use crate::network::{tansig_derivative, weighted_squared_error, TansigNetwork};
use crate::pair::TrainingPair;
use crate::params::{ParamLayout, ParamSlot};
use ndarray::Array1;

/// Per-layer sensitivities `∂E/∂net` for one pair.
///
/// Output layer: `−2·w²·(t − o)·f'(net)` (no `f'` for a linear output).
/// Hidden layers: `f'(net_l) ⊙ (Wᵀ_{l+1} · s_{l+1})`.
fn sensitivities(
    net: &TansigNetwork,
    net_inputs: &[Array1<f64>],
    output: &Array1<f64>,
    target: &Array1<f64>,
    error_weights: Option<&Array1<f64>>,
) -> Vec<Array1<f64>> {
    let layers = net.layers();
    let last = layers.len() - 1;

    let mut out_s = Array1::zeros(output.len());
    for r in 0..output.len() {
        let w = error_weights.map_or(1.0, |w| w[r]);
        let mut s = -2.0 * w * w * (target[r] - output[r]);
        if net.is_tansig_layer(last) {
            s *= tansig_derivative(net_inputs[last][r]);
        }
        out_s[r] = s;
    }

    let mut sens = vec![Array1::zeros(0); layers.len()];
    sens[last] = out_s;
    for l in (0..last).rev() {
        let back = layers[l + 1].weights.t().dot(&sens[l + 1]);
        sens[l] = back * net_inputs[l].mapv(tansig_derivative);
    }
    sens
}

/// Gradient of the pair's weighted squared error with respect to every
/// parameter, written into `gradient` in flat order. Returns the error.
pub fn backprop_gradient(
    net: &TansigNetwork,
    pair: &TrainingPair,
    error_weights: Option<&Array1<f64>>,
    gradient: &mut Array1<f64>,
) -> f64 {
    assert_eq!(
        pair.target().len(),
        net.output_count(),
        "target has {} components, network has {} outputs",
        pair.target().len(),
        net.output_count()
    );
    let layout = ParamLayout::of(net);
    assert_eq!(gradient.len(), layout.len(), "gradient length mismatch");

    let trace = net.forward(pair.input());
    let output = trace.output();
    let sens = sensitivities(net, &trace.net_inputs, output, pair.target(), error_weights);

    for (i, slot) in layout.slots() {
        gradient[i] = match slot {
            ParamSlot::Weight { layer, row, col } => {
                let x = if layer == 0 {
                    pair.input()[col]
                } else {
                    trace.outputs[layer - 1][col]
                };
                sens[layer][row] * x
            }
            ParamSlot::Bias { layer, row } => sens[layer][row],
        };
    }

    weighted_squared_error(pair.target(), output, error_weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InitSpan;
    use crate::params::{flatten, unflatten_into};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fd_gradient(
        net: &TansigNetwork,
        pair: &TrainingPair,
        weights: Option<&Array1<f64>>,
    ) -> Array1<f64> {
        let base = flatten(net);
        let h = 1e-6;
        let mut probe = net.clone();
        let mut fd = Array1::zeros(base.len());
        for i in 0..base.len() {
            let mut p = base.clone();
            p[i] += h;
            unflatten_into(&mut probe, &p);
            let plus = probe.squared_error(pair, weights);
            p[i] -= 2.0 * h;
            unflatten_into(&mut probe, &p);
            let minus = probe.squared_error(pair, weights);
            fd[i] = (plus - minus) / (2.0 * h);
        }
        fd
    }

    fn assert_close(a: &Array1<f64>, b: &Array1<f64>, tol: f64) {
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            let scale = 1.0 + x.abs().max(y.abs());
            assert!((x - y).abs() < tol * scale, "param {i}: analytic {x}, fd {y}");
        }
    }

    #[test]
    fn test_gradient_matches_fd_purelin() {
        let mut rng = StdRng::seed_from_u64(42);
        let net = TansigNetwork::random(3, &[5, 4, 2], true, InitSpan::new(1.0, 1.0), &mut rng)
            .unwrap();
        let pair = TrainingPair::new(array![0.3, -0.8, 0.5], array![0.2, -0.4]);
        let mut g = Array1::zeros(net.param_count());
        let err = backprop_gradient(&net, &pair, None, &mut g);
        assert!((err - net.squared_error(&pair, None)).abs() < 1e-15);
        assert_close(&g, &fd_gradient(&net, &pair, None), 1e-6);
    }

    #[test]
    fn test_gradient_matches_fd_tansig_output_weighted() {
        let mut rng = StdRng::seed_from_u64(7);
        let net = TansigNetwork::random(2, &[3, 2], false, InitSpan::new(1.5, 1.0), &mut rng)
            .unwrap();
        let pair = TrainingPair::new(array![1.2, -0.1], array![0.9, 0.1]);
        let weights = array![2.0, 0.5];
        let mut g = Array1::zeros(net.param_count());
        backprop_gradient(&net, &pair, Some(&weights), &mut g);
        assert_close(&g, &fd_gradient(&net, &pair, Some(&weights)), 1e-6);
    }

    #[test]
    fn test_single_layer_network() {
        let mut rng = StdRng::seed_from_u64(1);
        let net = TansigNetwork::random(4, &[1], true, InitSpan::new(1.0, 1.0), &mut rng).unwrap();
        let pair = TrainingPair::new(array![1.0, 2.0, 3.0, 4.0], array![0.0]);
        let mut g = Array1::zeros(net.param_count());
        backprop_gradient(&net, &pair, None, &mut g);
        // Linear single layer: dE/dw_i = -2 (t - o) x_i, dE/db = -2 (t - o).
        let o = net.eval(pair.input())[0];
        assert!((g[4] - (-2.0 * (0.0 - o))).abs() < 1e-12);
        assert!((g[2] - (-2.0 * (0.0 - o) * 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_error_zero_gradient() {
        let mut rng = StdRng::seed_from_u64(2);
        let net = TansigNetwork::random(2, &[3, 1], true, InitSpan::new(1.0, 1.0), &mut rng)
            .unwrap();
        let input = array![0.4, 0.6];
        let pair = TrainingPair::new(input.clone(), net.eval(&input));
        let mut g = Array1::from_elem(net.param_count(), 9.0);
        let err = backprop_gradient(&net, &pair, None, &mut g);
        assert_eq!(err, 0.0);
        assert!(g.iter().all(|&v| v == 0.0));
    }
}
