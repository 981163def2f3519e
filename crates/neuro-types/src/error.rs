// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeuroError {
    /// Caller supplied degenerate input (empty batch, mismatched dimensions).
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network file is readable but its contents are corrupt.
    #[error("Malformed network file at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type NeuroResult<T> = Result<T, NeuroError>;
