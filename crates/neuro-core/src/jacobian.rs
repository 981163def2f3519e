// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Forward Jacobian Propagation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Forward-mode propagation of parameter Jacobians through a network.
//!
//! Every matrix shares one column space (the trained network's flat
//! parameters). Row counts follow the layer widths, with index 0 holding the
//! Jacobian of the network input.

use crate::network::{tansig_derivative, TansigNetwork};
use crate::params::{ParamLayout, ParamSlot};
use ndarray::linalg::general_mat_mul;
use ndarray::{Array1, Array2};

/// Whether the propagated network's own parameters are differentiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JacobianMode {
    /// The network is being trained; its parameters occupy columns `0..P`.
    OwnParameters,
    /// The network is frozen; only the incoming dependence is carried.
    ExternalOnly,
}

/// Per-layer Jacobian buffers for one network.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerJacobians {
    mats: Vec<Array2<f64>>,
}

impl LayerJacobians {
    /// Zeroed buffers: `inputs × columns`, then one `neurons × columns` per layer.
    pub fn new(net: &TansigNetwork, columns: usize) -> Self {
        let mut mats = Vec::with_capacity(net.layer_count() + 1);
        mats.push(Array2::zeros((net.input_count(), columns)));
        for layer in net.layers() {
            mats.push(Array2::zeros((layer.neurons(), columns)));
        }
        LayerJacobians { mats }
    }

    pub fn columns(&self) -> usize {
        self.mats[0].ncols()
    }

    pub fn input(&self) -> &Array2<f64> {
        &self.mats[0]
    }

    /// Seed for the next propagation.
    pub fn input_mut(&mut self) -> &mut Array2<f64> {
        &mut self.mats[0]
    }

    /// Jacobian of the network output.
    pub fn output(&self) -> &Array2<f64> {
        &self.mats[self.mats.len() - 1]
    }

    /// Jacobian after layer `l` (`0` is the input).
    pub fn stage(&self, l: usize) -> &Array2<f64> {
        &self.mats[l]
    }
}

/// Evaluate `net` on `input`, propagating the seeded input Jacobian to the
/// output: `J_{l+1} = f'(net_l) ⊙ (W_l · J_l [+ own-parameter columns])`.
///
/// Returns the network output.
pub fn propagate_jacobians(
    net: &TansigNetwork,
    input: &Array1<f64>,
    jacobians: &mut LayerJacobians,
    mode: JacobianMode,
) -> Array1<f64> {
    assert_eq!(
        jacobians.mats.len(),
        net.layer_count() + 1,
        "jacobian buffers were built for a different network"
    );
    let layout = match mode {
        JacobianMode::OwnParameters => {
            let layout = ParamLayout::of(net);
            assert!(
                jacobians.columns() >= layout.len(),
                "own-parameter mode needs at least {} columns, buffers have {}",
                layout.len(),
                jacobians.columns()
            );
            Some(layout)
        }
        JacobianMode::ExternalOnly => None,
    };

    let trace = net.forward(input);
    for (l, layer) in net.layers().iter().enumerate() {
        let (head, tail) = jacobians.mats.split_at_mut(l + 1);
        let upstream = &head[l];
        let next = &mut tail[0];
        general_mat_mul(1.0, &layer.weights, upstream, 0.0, next);

        if let Some(layout) = &layout {
            let x = if l == 0 { input } else { &trace.outputs[l - 1] };
            for (col, slot) in layout.layer_slots(l) {
                match slot {
                    ParamSlot::Weight { row, col: i, .. } => next[[row, col]] += x[i],
                    ParamSlot::Bias { row, .. } => next[[row, col]] += 1.0,
                }
            }
        }

        if net.is_tansig_layer(l) {
            for (mut row, &n) in next.outer_iter_mut().zip(trace.net_inputs[l].iter()) {
                row *= tansig_derivative(n);
            }
        }
    }
    trace.into_output()
}
