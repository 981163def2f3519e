// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Progress and Results
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use std::sync::atomic::{AtomicBool, Ordering};

/// Errors after iteration (or epoch) `index`; index 0 is the starting point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub index: usize,
    pub training_error: f64,
    pub generalization_error: f64,
    pub validation_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Relative improvement stayed below epsilon long enough.
    Converged,
    /// Generalization error stopped improving.
    Overlearning,
    IterationLimit,
    /// Training error reached epsilon.
    ErrorTarget,
    Cancelled,
    /// Line-search baseline pinned at its floor without progress.
    StepUnderflow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    pub iterations: usize,
    pub training_error: f64,
    pub generalization_error: f64,
    pub validation_error: f64,
    pub stop_reason: StopReason,
}

pub(crate) fn is_cancelled(flag: &AtomicBool) -> bool {
    flag.load(Ordering::Relaxed)
}
