// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Property-Based Tests (proptest) for neuro-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for neuro-core using proptest.
//!
//! Covers: evaluation determinism across clones, backprop vs finite
//! differences, flatten/unflatten identity, text serialization.

use ndarray::Array1;
use neuro_core::backprop::backprop_gradient;
use neuro_core::network::{InitSpan, TansigNetwork};
use neuro_core::pair::TrainingPair;
use neuro_core::params::{flatten, unflatten_into, ParamLayout};
use neuro_core::serialize::{read_network, write_network};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn random_net(seed: u64, inputs: usize, hidden: usize, outputs: usize, purelin: bool) -> TansigNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    TansigNetwork::random(inputs, &[hidden, outputs], purelin, InitSpan::new(1.0, 1.0), &mut rng)
        .unwrap()
}

fn input_for(seed: u64, n: usize) -> Array1<f64> {
    Array1::from_shape_fn(n, |i| ((seed as f64 + 1.0) * (i as f64 + 0.7)).sin())
}

// ── Evaluation ───────────────────────────────────────────────────────

proptest! {
    /// Clones evaluate bit-identically, and repeated evaluation is stable.
    #[test]
    fn eval_deterministic_across_clones(
        seed in 0u64..1000,
        inputs in 1usize..6,
        hidden in 1usize..8,
        outputs in 1usize..4,
        purelin in any::<bool>(),
    ) {
        let net = random_net(seed, inputs, hidden, outputs, purelin);
        let copy = net.clone();
        let x = input_for(seed, inputs);
        let a = net.eval(&x);
        prop_assert_eq!(&a, &copy.eval(&x));
        prop_assert_eq!(&a, &net.eval(&x));
        let fwd = net.forward(&x);
        prop_assert_eq!(&a, fwd.output());
    }
}

// ── Gradients ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Reverse-mode gradient agrees with centered finite differences.
    #[test]
    fn backprop_matches_finite_differences(
        seed in 0u64..1000,
        inputs in 1usize..4,
        hidden in 1usize..6,
        outputs in 1usize..3,
        purelin in any::<bool>(),
    ) {
        let net = random_net(seed, inputs, hidden, outputs, purelin);
        let pair = TrainingPair::new(input_for(seed, inputs), input_for(seed + 7, outputs) * 0.5);
        let mut g = Array1::zeros(net.param_count());
        backprop_gradient(&net, &pair, None, &mut g);

        let base = flatten(&net);
        let mut probe = net.clone();
        let h = 1e-6;
        for k in 0..base.len() {
            let mut theta = base.clone();
            theta[k] += h;
            unflatten_into(&mut probe, &theta);
            let plus = probe.squared_error(&pair, None);
            theta[k] -= 2.0 * h;
            unflatten_into(&mut probe, &theta);
            let minus = probe.squared_error(&pair, None);
            let fd = (plus - minus) / (2.0 * h);
            prop_assert!((fd - g[k]).abs() < 1e-5 * (1.0 + g[k].abs()),
                "param {}: analytic {}, fd {}", k, g[k], fd);
        }
    }

    /// Flatten then unflatten into a zeroed twin reproduces the network.
    #[test]
    fn flatten_unflatten_identity(
        seed in 0u64..1000,
        inputs in 1usize..6,
        hidden in 1usize..8,
        outputs in 1usize..4,
    ) {
        let net = random_net(seed, inputs, hidden, outputs, true);
        let flat = flatten(&net);
        prop_assert_eq!(flat.len(), ParamLayout::of(&net).len());
        let mut twin = TansigNetwork::random(
            inputs, &[hidden, outputs], true, InitSpan::zero(), &mut StdRng::seed_from_u64(0),
        ).unwrap();
        unflatten_into(&mut twin, &flat);
        prop_assert_eq!(twin, net);
    }
}

// ── Serialization ────────────────────────────────────────────────────

proptest! {
    /// Saved networks reload with identical evaluation.
    #[test]
    fn text_roundtrip_preserves_eval(
        seed in 0u64..1000,
        inputs in 1usize..6,
        hidden in 1usize..8,
        outputs in 1usize..4,
        purelin in any::<bool>(),
    ) {
        let net = random_net(seed, inputs, hidden, outputs, purelin);
        let mut buf = Vec::new();
        write_network(&net, &mut buf).unwrap();
        let back = read_network(buf.as_slice()).unwrap();
        let x = input_for(seed, inputs);
        prop_assert_eq!(back.eval(&x), net.eval(&x));
        prop_assert_eq!(back.is_purelin_output(), purelin);
    }
}
