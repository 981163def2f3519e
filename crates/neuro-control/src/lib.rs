// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Neuro Control
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-loop plants for regulator training.
//!
//! Regulator → clamped control signal → frozen emulator → state update, with
//! a first-order actuator on the control surface.

pub mod actuator;
pub mod closed_loop;
