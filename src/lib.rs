//! QRLME ― residue-number-system encoding scheme  (research prototype)
//!
//! A plaintext `p < key` is stored as its residues modulo a fixed set of
//! moduli, `key` being their product. Residue-wise addition and
//! multiplication are homomorphic modulo `key`. Not a secure cryptosystem:
//! the encryption noise is a multiple of `key` and vanishes in every residue.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, missing_docs)]

pub mod algebra;
pub mod cipher;
pub mod config;
pub mod dataset;
pub mod error;
pub mod modulus;
pub mod pipeline;
pub mod scheme;

pub use algebra::QrlmeAlgebra;
pub use cipher::{Cipher, Residue};
pub use config::Config;
pub use dataset::DatasetSpec;
pub use error::{ConfigError, DatasetError, PipelineError, QrlmeError, QrlmeResult};
pub use modulus::{CrtBasis, ModulusSet};
pub use pipeline::{BatchPipeline, FileReport, PipelineOptions, RecordPolicy};
pub use scheme::{DecryptStrategy, NoiseRange, Qrlme};
