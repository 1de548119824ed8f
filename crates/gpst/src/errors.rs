use thiserror::Error;

use crate::field::ValueKind;

/// Why a field write was rejected. Never fatal: the store logs it and drops
/// the field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expected {expected}, got {found}")]
    WrongKind { expected: ValueKind, found: ValueKind },

    #[error("value {value} below minimum {min}")]
    BelowMinimum { value: f64, min: f64 },

    #[error("value {value} above maximum {max}")]
    AboveMaximum { value: f64, max: f64 },

    #[error("value {0} is not finite")]
    NotFinite(f64),
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX parsing error: {0}")]
    GpxParsing(String),

    #[error("FIT parsing error: {0}")]
    FitParsing(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX writing error: {0}")]
    GpxWriting(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
}
