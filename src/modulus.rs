//! Modulus set, key material and CRT basis.

use crate::error::{QrlmeError, QrlmeResult};
use itertools::Itertools;
use num_integer::Integer;
use tracing::debug;

/// Ordered residue system `(m₀, m₁, …)` with key `∏ mᵢ`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModulusSet {
    moduli: Vec<u64>,
    key: u64,
}

impl ModulusSet {
    /// Validate the moduli and derive the key material.
    ///
    /// Every modulus must be ≥ 2 and appear once. Pairwise coprimality is
    /// required for unique decryption but is not checked here.
    pub fn new(moduli: Vec<u64>) -> QrlmeResult<Self> {
        let key = generate_key(&moduli)?;
        debug!(?moduli, key, "modulus set created");
        Ok(Self { moduli, key })
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Product of all moduli.
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn len(&self) -> usize {
        self.moduli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moduli.is_empty()
    }

    /// `true` when gcd(mᵢ, mⱼ) = 1 for every i ≠ j.
    pub fn is_pairwise_coprime(&self) -> bool {
        self.moduli
            .iter()
            .tuple_combinations()
            .all(|(a, b)| a.gcd(b) == 1)
    }
}

/// Key material: the product of the moduli.
pub fn generate_key(moduli: &[u64]) -> QrlmeResult<u64> {
    if moduli.is_empty() {
        return Err(QrlmeError::InvalidModulus {
            reason: "modulus set is empty".into(),
        });
    }
    if let Some(&m) = moduli.iter().find(|&&m| m < 2) {
        return Err(QrlmeError::InvalidModulus {
            reason: format!("modulus {m} is smaller than 2"),
        });
    }
    if let Some(m) = moduli.iter().duplicates().next() {
        return Err(QrlmeError::InvalidModulus {
            reason: format!("modulus {m} appears more than once"),
        });
    }
    moduli
        .iter()
        .try_fold(1u64, |acc, &m| acc.checked_mul(m))
        .ok_or_else(|| QrlmeError::InvalidModulus {
            reason: "product of moduli overflows u64".into(),
        })
}

/// Precomputed reconstruction terms `Mᵢ = key / mᵢ` and `Mᵢ⁻¹ mod mᵢ`.
#[derive(Clone, Debug)]
pub struct CrtBasis {
    key: u64,
    terms: Vec<CrtTerm>,
}

#[derive(Clone, Debug)]
struct CrtTerm {
    modulus: u64,
    cofactor: u64,
    inverse: u64,
}

impl CrtBasis {
    /// Fails with `InvalidModulus` when the set is not pairwise coprime.
    pub fn new(set: &ModulusSet) -> QrlmeResult<Self> {
        if !set.is_pairwise_coprime() {
            return Err(QrlmeError::InvalidModulus {
                reason: format!("moduli {:?} are not pairwise coprime", set.moduli()),
            });
        }
        let terms = set
            .moduli()
            .iter()
            .map(|&m| {
                let cofactor = set.key() / m;
                let inverse = mod_inverse(u128::from(cofactor % m), u128::from(m)).ok_or_else(
                    || QrlmeError::InvalidModulus {
                        reason: format!("{cofactor} has no inverse modulo {m}"),
                    },
                )?;
                Ok(CrtTerm {
                    modulus: m,
                    cofactor,
                    inverse: inverse as u64,
                })
            })
            .collect::<QrlmeResult<Vec<_>>>()?;
        Ok(Self {
            key: set.key(),
            terms,
        })
    }

    /// x = Σ rᵢ·Mᵢ⁻¹·Mᵢ  (mod key), residues given in basis order.
    pub fn reconstruct(&self, residues: &[u64]) -> u64 {
        let key = u128::from(self.key);
        let sum = self
            .terms
            .iter()
            .zip(residues)
            .fold(0u128, |acc, (t, &r)| {
                let m = u128::from(t.modulus);
                let scaled = (u128::from(r) % m) * u128::from(t.inverse) % m;
                (acc + scaled * u128::from(t.cofactor)) % key
            });
        sum as u64
    }
}

/// Extended Euclid on signed values: returns (g, x, y) with a·x + b·y = g.
fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
    if b == 0 {
        (a, 1, 0)
    } else {
        let (g, x1, y1) = extended_gcd(b, a % b);
        (g, y1, x1 - (a / b) * y1)
    }
}

/// a⁻¹ mod m, or `None` if gcd(a, m) ≠ 1.
pub(crate) fn mod_inverse(a: u128, m: u128) -> Option<u128> {
    if m == 1 {
        return Some(0);
    }
    let (g, x, _) = extended_gcd(a as i128, m as i128);
    if g != 1 {
        None
    } else {
        let m = m as i128;
        Some(((x % m + m) % m) as u128)
    }
}
