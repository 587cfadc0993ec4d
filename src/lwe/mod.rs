//! LWE instances: secret, noise, and raw sample generation.

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{BkwError, Result};
use crate::ring::modular::{dot_mod, mod_add, to_residue};
use crate::sampling::{fill_uniform, DiscreteGaussian};
use crate::storage::{SampleList, SampleRef, SortedSamples};

/// Largest supported dimension.
pub const MAX_N: usize = 50;

/// An LWE instance over Z_q^n with a secret drawn from the noise distribution.
///
/// Holds its own seeded RNG so that a seed fixes the secret and every
/// sample generated afterwards.
#[derive(Clone, Debug)]
pub struct LweInstance {
    pub n: usize,
    pub q: u16,
    pub alpha: f64,
    pub sigma: f64,
    pub secret: Vec<u16>,
    gaussian: DiscreteGaussian,
    rng: ChaCha20Rng,
}

impl LweInstance {
    /// New instance with noise width `sigma = alpha * q`.
    pub fn new(n: usize, q: u16, alpha: f64, seed: u64) -> Result<Self> {
        Self::with_rng(n, q, alpha, ChaCha20Rng::seed_from_u64(seed))
    }

    pub fn with_rng(n: usize, q: u16, alpha: f64, mut rng: ChaCha20Rng) -> Result<Self> {
        if n == 0 || n > MAX_N {
            return Err(BkwError::InvalidParam(format!("dimension {n} outside 1..={MAX_N}")));
        }
        if q < 3 || q & 1 == 0 {
            return Err(BkwError::InvalidParam(format!("modulus must be odd and >= 3, got {q}")));
        }
        let sigma = alpha * q as f64;
        let gaussian = DiscreteGaussian::new(sigma)?;
        let secret = (0..n).map(|_| to_residue(gaussian.sample(&mut rng), q)).collect();
        Ok(Self { n, q, alpha, sigma, secret, gaussian, rng })
    }

    /// Draw `count` fresh samples `(a, <a,s> + e)`, `a` uniform, `e` Gaussian.
    pub fn generate_samples(&mut self, count: usize) -> Result<SampleList> {
        let mut list = SampleList::with_capacity(self.n, count)?;
        let mut a = vec![0u16; self.n];
        // a zero `a` is refused by the pool and drawn again
        while !list.is_full() {
            fill_uniform(&mut a, self.q, &mut self.rng);
            let error = to_residue(self.gaussian.sample(&mut self.rng), self.q);
            let z = mod_add(dot_mod(&a, &self.secret, self.q), error, self.q);
            list.push(SampleRef { a: &a, z, error })?;
        }
        debug!("generated {count} samples for n = {}, q = {}", self.n, self.q);
        Ok(list)
    }

    /// `<a,s> + e == z (mod q)` for a sample carrying its error term.
    pub fn verify_sample(&self, sample: SampleRef<'_>) -> bool {
        sample.a.len() == self.n && mod_add(dot_mod(sample.a, &self.secret, self.q), sample.error, self.q) == sample.z
    }

    /// Number of samples in the pool failing the oracle check.
    pub fn verify_list(&self, list: &SampleList) -> usize {
        list.iter().filter(|s| !self.verify_sample(*s)).count()
    }

    /// Number of samples in the sorted store failing the oracle check.
    pub fn verify_sorted(&self, store: &SortedSamples) -> usize {
        store.iter().filter(|s| !self.verify_sample(*s)).count()
    }

    /// Parity of the secret under the signed-residue view.
    pub fn binary_secret(&self) -> Vec<u8> {
        self.secret.iter().map(|&s| binary_residue(s, self.q)).collect()
    }
}

/// Parity of the signed representative of `x`: `x mod 2` below q/2 and
/// `(x + 1) mod 2` above it.
#[inline]
pub fn binary_residue(x: u16, q: u16) -> u8 {
    if x < q / 2 {
        (x % 2) as u8
    } else {
        ((x as u32 + 1) % 2) as u8
    }
}
