// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Neuro Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scaled-tanh networks and their derivatives.
//!
//! Reverse-mode gradients for supervised pairs, forward-mode Jacobians for
//! differentiating through closed-loop rollouts.

pub mod backprop;
pub mod batch;
pub mod jacobian;
pub mod network;
pub mod pair;
pub mod params;
pub mod rollout;
pub mod serialize;
