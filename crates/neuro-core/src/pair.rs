// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Training Pairs
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use ndarray::Array1;

/// Supervised sample: input vector and target output vector. Immutable once
/// built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPair {
    input: Array1<f64>,
    target: Array1<f64>,
}

impl TrainingPair {
    pub fn new(input: Array1<f64>, target: Array1<f64>) -> Self {
        TrainingPair { input, target }
    }

    pub fn input(&self) -> &Array1<f64> {
        &self.input
    }

    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }
}
