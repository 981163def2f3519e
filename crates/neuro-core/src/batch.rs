// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Parallel Batch Gradient
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Mean error and gradient over a batch of pairs, fanned out with rayon.
//!
//! Workers evaluate against the shared immutable network, each with its own
//! trace and gradient buffer. Partial sums meet in a single mutex-guarded
//! accumulator, so results agree with a serial sum up to summation order.

use crate::backprop::backprop_gradient;
use crate::network::TansigNetwork;
use crate::pair::TrainingPair;
use ndarray::Array1;
use neuro_types::error::{NeuroError, NeuroResult};
use rayon::prelude::*;
use std::borrow::Borrow;
use std::sync::{Mutex, PoisonError};

/// Mean weighted squared error and mean gradient over `batch`.
///
/// Accepts owned pairs or references, so minibatches can be gathered without
/// copying samples.
pub fn batch_gradient<P>(
    net: &TansigNetwork,
    batch: &[P],
    error_weights: Option<&Array1<f64>>,
    gradient: &mut Array1<f64>,
) -> NeuroResult<f64>
where
    P: Borrow<TrainingPair> + Sync,
{
    if batch.is_empty() {
        return Err(NeuroError::Precondition(
            "batch gradient over an empty batch".to_string(),
        ));
    }
    let p = net.param_count();
    if gradient.len() != p {
        return Err(NeuroError::Precondition(format!(
            "gradient buffer has {} entries, network has {p} parameters",
            gradient.len()
        )));
    }

    let accumulator = Mutex::new((0.0_f64, Array1::<f64>::zeros(p)));
    batch.par_iter().for_each(|item| {
        let mut local = Array1::zeros(p);
        let err = backprop_gradient(net, item.borrow(), error_weights, &mut local);
        let mut acc = accumulator.lock().unwrap_or_else(PoisonError::into_inner);
        acc.0 += err;
        acc.1 += &local;
    });

    let (sum_err, sum_grad) = accumulator
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let n = batch.len() as f64;
    gradient.assign(&(sum_grad / n));
    Ok(sum_err / n)
}

/// Mean weighted squared error over `pairs`; `0.0` for an empty set.
pub fn mean_squared_error<P>(
    net: &TansigNetwork,
    pairs: &[P],
    error_weights: Option<&Array1<f64>>,
) -> f64
where
    P: Borrow<TrainingPair> + Sync,
{
    if pairs.is_empty() {
        return 0.0;
    }
    let total: f64 = pairs
        .par_iter()
        .map(|item| net.squared_error(item.borrow(), error_weights))
        .sum();
    total / pairs.len() as f64
}
