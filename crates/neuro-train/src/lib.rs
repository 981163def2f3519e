// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Neuro Train
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Trainers for scaled-tanh networks.
//!
//! Every trainer works against an [`objective::Objective`], so the same
//! optimizer drives supervised pairs and closed-loop rollouts.

pub mod conjugate;
pub mod line_search;
pub mod objective;
pub mod progress;
pub mod stochastic;
pub mod stopping;
pub mod swarm;
