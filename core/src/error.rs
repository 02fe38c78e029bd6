//! Error types for the mixing solver

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixError {
    #[error("Invalid hex color {0:?}: expected #RRGGBB or #RGB")]
    InvalidHexFormat(String),

    #[error("No inks provided")]
    EmptyPalette,

    #[error("Invalid ink limit {0}: must be at least 1")]
    InvalidLimit(usize),

    #[error("Mix computation was cancelled")]
    Cancelled,
}

pub type Result<T, E = MixError> = std::result::Result<T, E>;
