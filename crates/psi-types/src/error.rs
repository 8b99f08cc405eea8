// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PsiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network construction error: {0}")]
    NetworkError(String),

    #[error("Grid index out of bounds: xi={xi}, size={size}")]
    GridOutOfBounds { xi: usize, size: usize },

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PsiResult<T> = Result<T, PsiError>;
