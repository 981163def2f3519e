// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Parameter Flattening
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flat parameter index space shared by gradients, Jacobians and optimizers.
//!
//! Order: for each layer, for each neuron row, the row's weights in column
//! order followed by the neuron's bias. [`ParamLayout`] is the only place that
//! order is defined; everything else iterates its slots.

use crate::network::{Layer, TansigNetwork};
use ndarray::Array1;

/// Location of one scalar parameter inside a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSlot {
    Weight { layer: usize, row: usize, col: usize },
    Bias { layer: usize, row: usize },
}

/// Mapping between `(layer, row, col)` positions and flat indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLayout {
    /// `(neurons, fan_in)` per layer.
    shapes: Vec<(usize, usize)>,
    offsets: Vec<usize>,
    total: usize,
}

impl ParamLayout {
    pub fn of(net: &TansigNetwork) -> Self {
        let shapes: Vec<(usize, usize)> = net
            .layers()
            .iter()
            .map(|l: &Layer| (l.neurons(), l.fan_in()))
            .collect();
        Self::from_shapes(&shapes)
    }

    pub fn from_shapes(shapes: &[(usize, usize)]) -> Self {
        let mut offsets = Vec::with_capacity(shapes.len());
        let mut total = 0;
        for &(neurons, fan_in) in shapes {
            offsets.push(total);
            total += neurons * (fan_in + 1);
        }
        ParamLayout {
            shapes: shapes.to_vec(),
            offsets,
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn weight_index(&self, layer: usize, row: usize, col: usize) -> usize {
        let (_, fan_in) = self.shapes[layer];
        self.offsets[layer] + row * (fan_in + 1) + col
    }

    pub fn bias_index(&self, layer: usize, row: usize) -> usize {
        let (_, fan_in) = self.shapes[layer];
        self.offsets[layer] + row * (fan_in + 1) + fan_in
    }

    /// `(flat_index, slot)` for every parameter of one layer, in flat order.
    pub fn layer_slots(&self, layer: usize) -> impl Iterator<Item = (usize, ParamSlot)> {
        let offset = self.offsets[layer];
        let (neurons, fan_in) = self.shapes[layer];
        (0..neurons)
            .flat_map(move |row| {
                (0..fan_in)
                    .map(move |col| ParamSlot::Weight { layer, row, col })
                    .chain(std::iter::once(ParamSlot::Bias { layer, row }))
            })
            .enumerate()
            .map(move |(k, slot)| (offset + k, slot))
    }

    /// `(flat_index, slot)` for every parameter of the network, in flat order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, ParamSlot)> + '_ {
        (0..self.shapes.len()).flat_map(move |layer| self.layer_slots(layer))
    }
}

/// Copy every parameter into a new flat vector.
pub fn flatten(net: &TansigNetwork) -> Array1<f64> {
    let mut out = Array1::zeros(net.param_count());
    flatten_into(net, &mut out);
    out
}

pub fn flatten_into(net: &TansigNetwork, out: &mut Array1<f64>) {
    let layout = ParamLayout::of(net);
    assert_eq!(out.len(), layout.len(), "parameter vector length mismatch");
    for (i, slot) in layout.slots() {
        out[i] = net.param(slot);
    }
}

/// Overwrite the network's parameters from a flat vector.
pub fn unflatten_into(net: &mut TansigNetwork, params: &Array1<f64>) {
    let layout = ParamLayout::of(net);
    assert_eq!(params.len(), layout.len(), "parameter vector length mismatch");
    for (i, slot) in layout.slots() {
        *net.param_mut(slot) = params[i];
    }
}

/// `θ ← θ + delta`.
pub fn add_to_params(net: &mut TansigNetwork, delta: &Array1<f64>) {
    let layout = ParamLayout::of(net);
    assert_eq!(delta.len(), layout.len(), "parameter vector length mismatch");
    for (i, slot) in layout.slots() {
        *net.param_mut(slot) += delta[i];
    }
}

/// `θ ← base − step·direction`, used by line searches against a snapshot.
pub fn descend_from(net: &mut TansigNetwork, base: &Array1<f64>, step: f64, direction: &Array1<f64>) {
    let layout = ParamLayout::of(net);
    assert_eq!(base.len(), layout.len(), "parameter vector length mismatch");
    assert_eq!(direction.len(), layout.len(), "direction length mismatch");
    for (i, slot) in layout.slots() {
        *net.param_mut(slot) = base[i] - step * direction[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InitSpan;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn net() -> TansigNetwork {
        let mut rng = StdRng::seed_from_u64(9);
        TansigNetwork::random(3, &[2, 2], true, InitSpan::new(1.0, 1.0), &mut rng).unwrap()
    }

    #[test]
    fn test_order_is_row_weights_then_bias() {
        let net = net();
        let flat = flatten(&net);
        assert_eq!(flat.len(), 2 * 4 + 2 * 3);
        let l0 = &net.layers()[0];
        assert_eq!(flat[0], l0.weights[[0, 0]]);
        assert_eq!(flat[2], l0.weights[[0, 2]]);
        assert_eq!(flat[3], l0.biases[0]);
        assert_eq!(flat[4], l0.weights[[1, 0]]);
        assert_eq!(flat[7], l0.biases[1]);
        let l1 = &net.layers()[1];
        assert_eq!(flat[8], l1.weights[[0, 0]]);
        assert_eq!(flat[10], l1.biases[0]);
        assert_eq!(flat[13], l1.biases[1]);
    }

    #[test]
    fn test_index_helpers_agree_with_slots() {
        let layout = ParamLayout::of(&net());
        for (i, slot) in layout.slots() {
            let expected = match slot {
                ParamSlot::Weight { layer, row, col } => layout.weight_index(layer, row, col),
                ParamSlot::Bias { layer, row } => layout.bias_index(layer, row),
            };
            assert_eq!(i, expected);
        }
        assert_eq!(layout.slots().count(), layout.len());
    }

    #[test]
    fn test_unflatten_restores_snapshot() {
        let mut n = net();
        let snapshot = flatten(&n);
        add_to_params(&mut n, &Array1::from_elem(snapshot.len(), 0.5));
        assert_ne!(flatten(&n), snapshot);
        unflatten_into(&mut n, &snapshot);
        assert_eq!(flatten(&n), snapshot);
    }

    #[test]
    fn test_descend_from_base() {
        let mut n = net();
        let base = flatten(&n);
        let dir = Array1::from_shape_fn(base.len(), |i| i as f64);
        descend_from(&mut n, &base, 0.25, &dir);
        let moved = flatten(&n);
        for i in 0..base.len() {
            assert!((moved[i] - (base[i] - 0.25 * i as f64)).abs() < 1e-15);
        }
    }
}
