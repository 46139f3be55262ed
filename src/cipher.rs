//! QRLME ciphertext container.

use serde::{Deserialize, Serialize};

/// One residue `value ∈ [0, modulus)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Residue {
    pub modulus: u64,
    #[serde(rename = "residue")]
    pub value: u64,
}

/// Residues of one plaintext, in the order of the modulus set that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cipher {
    pub residues: Vec<Residue>,
}

impl Cipher {
    pub fn from_pairs<I: IntoIterator<Item = (u64, u64)>>(pairs: I) -> Self {
        Self {
            residues: pairs
                .into_iter()
                .map(|(modulus, value)| Residue { modulus, value })
                .collect(),
        }
    }

    /// Moduli this ciphertext is keyed by, in order.
    pub fn moduli(&self) -> Vec<u64> {
        self.residues.iter().map(|r| r.modulus).collect()
    }

    /// Residue stored for `modulus`, if any.
    pub fn get(&self, modulus: u64) -> Option<u64> {
        self.residues
            .iter()
            .find(|r| r.modulus == modulus)
            .map(|r| r.value)
    }

    pub fn values(&self) -> Vec<u64> {
        self.residues.iter().map(|r| r.value).collect()
    }

    /// `true` if keyed by exactly `moduli`, same order.
    pub fn is_keyed_by(&self, moduli: &[u64]) -> bool {
        self.residues.len() == moduli.len()
            && self
                .residues
                .iter()
                .zip(moduli)
                .all(|(r, &m)| r.modulus == m)
    }
}
