//! Error types for the codec and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the modulus set, the codec and the homomorphic algebra.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrlmeError {
    #[error("invalid modulus set: {reason}")]
    InvalidModulus { reason: String },

    #[error("invalid noise range: min {min} > max {max}")]
    InvalidNoiseRange { min: u64, max: u64 },

    #[error("plaintext {plaintext} out of range [0, {key})")]
    PlaintextOutOfRange { plaintext: u128, key: u64 },

    #[error("no candidate in [0, key) satisfies every residue")]
    DecryptionFailed,

    #[error("modulus mismatch: expected {expected:?}, got {actual:?}")]
    ModulusMismatch { expected: Vec<u64>, actual: Vec<u64> },
}

pub type QrlmeResult<T> = Result<T, QrlmeError>;

/// Errors raised while writing a synthetic dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the batch pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("{path}:{line}: not a non-negative decimal integer: {content:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("codec error: {source}")]
    Codec {
        #[from]
        source: QrlmeError,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while reading configuration overrides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
