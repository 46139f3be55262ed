//! Homomorphic add / mult, residue-wise.

use crate::{
    cipher::{Cipher, Residue},
    error::{QrlmeError, QrlmeResult},
    modulus::ModulusSet,
};

/// Holds the moduli both operands must be keyed by.
#[derive(Clone, Debug)]
pub struct QrlmeAlgebra {
    moduli: Vec<u64>,
}

impl QrlmeAlgebra {
    pub fn new(set: &ModulusSet) -> Self {
        Self {
            moduli: set.moduli().to_vec(),
        }
    }

    /// `(a[m] + b[m]) mod m` for every modulus.
    pub fn add(&self, a: &Cipher, b: &Cipher) -> QrlmeResult<Cipher> {
        self.combine(a, b, |x, y| x + y)
    }

    /// `(a[m] · b[m]) mod m` for every modulus.
    pub fn mult(&self, a: &Cipher, b: &Cipher) -> QrlmeResult<Cipher> {
        self.combine(a, b, |x, y| x * y)
    }

    fn combine<F>(&self, a: &Cipher, b: &Cipher, op: F) -> QrlmeResult<Cipher>
    where
        F: Fn(u128, u128) -> u128,
    {
        self.check(a)?;
        self.check(b)?;
        let residues = a
            .residues
            .iter()
            .zip(&b.residues)
            .map(|(ra, rb)| {
                let m = u128::from(ra.modulus);
                Residue {
                    modulus: ra.modulus,
                    value: (op(u128::from(ra.value), u128::from(rb.value)) % m) as u64,
                }
            })
            .collect();
        Ok(Cipher { residues })
    }

    fn check(&self, c: &Cipher) -> QrlmeResult<()> {
        if c.is_keyed_by(&self.moduli) {
            Ok(())
        } else {
            Err(QrlmeError::ModulusMismatch {
                expected: self.moduli.clone(),
                actual: c.moduli(),
            })
        }
    }
}
