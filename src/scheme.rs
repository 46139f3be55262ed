//! Encryption & decryption.
//!
//! `r_m = (p + n·key) mod m` for every modulus `m`. Since `key` is a multiple
//! of each `m`, the noise term `n·key` vanishes modulo every modulus and the
//! stored residues are exactly `p mod m` whatever `n` is drawn. The scheme is
//! kept that way; the noise draw has no effect on the ciphertext.

use crate::{
    algebra::QrlmeAlgebra,
    cipher::{Cipher, Residue},
    error::{QrlmeError, QrlmeResult},
    modulus::{CrtBasis, ModulusSet},
};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Inclusive range the per-encryption noise is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NoiseRange {
    min: u64,
    max: u64,
}

impl Default for NoiseRange {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl NoiseRange {
    pub fn new(min: u64, max: u64) -> QrlmeResult<Self> {
        if min > max {
            return Err(QrlmeError::InvalidNoiseRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        Uniform::new_inclusive(self.min, self.max).sample(rng)
    }
}

/// How `decrypt` reconstructs a plaintext from its residues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecryptStrategy {
    /// Linear scan of `[0, key)`.
    #[default]
    BruteForce,
    /// Chinese remainder reconstruction; needs pairwise coprime moduli.
    Crt,
}

/// Codec state: modulus set, key, noise range and decrypt strategy.
#[derive(Clone, Debug)]
pub struct Qrlme {
    set: ModulusSet,
    noise: NoiseRange,
    strategy: DecryptStrategy,
    crt: Option<CrtBasis>,
    algebra: QrlmeAlgebra,
}

impl Qrlme {
    /// Codec with default noise `[1, 10]` and brute-force decryption.
    pub fn new(moduli: Vec<u64>) -> QrlmeResult<Self> {
        let set = ModulusSet::new(moduli)?;
        let algebra = QrlmeAlgebra::new(&set);
        Ok(Self {
            set,
            noise: NoiseRange::default(),
            strategy: DecryptStrategy::BruteForce,
            crt: None,
            algebra,
        })
    }

    #[must_use]
    pub fn with_noise(mut self, noise: NoiseRange) -> Self {
        self.noise = noise;
        self
    }

    /// Switch decryption strategy. `Crt` fails on non-coprime moduli.
    pub fn with_strategy(mut self, strategy: DecryptStrategy) -> QrlmeResult<Self> {
        self.crt = match strategy {
            DecryptStrategy::BruteForce => None,
            DecryptStrategy::Crt => Some(CrtBasis::new(&self.set)?),
        };
        self.strategy = strategy;
        Ok(self)
    }

    pub fn modulus_set(&self) -> &ModulusSet {
        &self.set
    }

    pub fn moduli(&self) -> &[u64] {
        self.set.moduli()
    }

    /// Key material: product of the moduli.
    pub fn key(&self) -> u64 {
        self.set.key()
    }

    pub fn noise(&self) -> NoiseRange {
        self.noise
    }

    pub fn strategy(&self) -> DecryptStrategy {
        self.strategy
    }

    /// Encrypt `plaintext ∈ [0, key)` with a fresh noise draw from `rng`.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        plaintext: u64,
        rng: &mut R,
    ) -> QrlmeResult<Cipher> {
        let noise = self.noise.sample(rng);
        self.encrypt_with_noise(plaintext, noise)
    }

    /// Encrypt with an explicit noise value.
    pub fn encrypt_with_noise(&self, plaintext: u64, noise: u64) -> QrlmeResult<Cipher> {
        let key = self.key();
        if plaintext >= key {
            return Err(QrlmeError::PlaintextOutOfRange {
                plaintext: u128::from(plaintext),
                key,
            });
        }
        // (p + n·key) fits in u128 for any u64 p, n, key
        let shifted = u128::from(plaintext) + u128::from(noise) * u128::from(key);
        let residues = self
            .moduli()
            .iter()
            .map(|&m| Residue {
                modulus: m,
                value: (shifted % u128::from(m)) as u64,
            })
            .collect();
        Ok(Cipher { residues })
    }

    /// Recover the plaintext. Fails with `ModulusMismatch` for a foreign
    /// ciphertext and `DecryptionFailed` if no value in `[0, key)` matches.
    #[instrument(level = "trace", skip_all)]
    pub fn decrypt(&self, c: &Cipher) -> QrlmeResult<u64> {
        self.check_shape(c)?;
        // a residue ≥ its modulus matches no candidate
        if let Some(r) = c.residues.iter().find(|r| r.value >= r.modulus) {
            warn!(modulus = r.modulus, residue = r.value, "residue out of range");
            return Err(QrlmeError::DecryptionFailed);
        }
        let residues = c.values();
        let found = match &self.crt {
            Some(basis) => {
                let candidate = basis.reconstruct(&residues);
                self.satisfies(candidate, &residues).then_some(candidate)
            }
            None => self.brute_force(&residues),
        };
        found.ok_or_else(|| {
            warn!(?residues, "decryption failed");
            QrlmeError::DecryptionFailed
        })
    }

    /// First `x ∈ [0, key)` with `x mod mᵢ = rᵢ` for all i.
    fn brute_force(&self, residues: &[u64]) -> Option<u64> {
        (0..self.key()).find(|&x| self.satisfies(x, residues))
    }

    fn satisfies(&self, x: u64, residues: &[u64]) -> bool {
        self.moduli()
            .iter()
            .zip(residues)
            .all(|(&m, &r)| x % m == r)
    }

    fn check_shape(&self, c: &Cipher) -> QrlmeResult<()> {
        if c.is_keyed_by(self.moduli()) {
            Ok(())
        } else {
            debug!(
                expected = ?self.moduli(),
                actual = ?c.moduli(),
                "ciphertext shape mismatch"
            );
            Err(QrlmeError::ModulusMismatch {
                expected: self.moduli().to_vec(),
                actual: c.moduli(),
            })
        }
    }

    /// Algebra over this codec's modulus set.
    pub fn algebra(&self) -> &QrlmeAlgebra {
        &self.algebra
    }

    /// Homomorphic addition; decrypts to `(p₁ + p₂) mod key`.
    pub fn add(&self, a: &Cipher, b: &Cipher) -> QrlmeResult<Cipher> {
        self.algebra.add(a, b)
    }

    /// Homomorphic multiplication; decrypts to `(p₁ · p₂) mod key`.
    pub fn mult(&self, a: &Cipher, b: &Cipher) -> QrlmeResult<Cipher> {
        self.algebra.mult(a, b)
    }
}
