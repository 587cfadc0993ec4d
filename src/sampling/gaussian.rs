use rand::Rng;

use crate::error::{BkwError, Result};

/// Rounded discrete Gaussian over Z centered at 0, sampled from a
/// cumulative distribution table.
///
/// The table covers [-tail, tail] with tail = ceil(6σ); mass beyond it is
/// negligible for the attack. Not constant time.
#[derive(Clone, Debug)]
pub struct DiscreteGaussian {
    tail: i64,
    cdf: Vec<f64>,
}

impl DiscreteGaussian {
    pub fn new(sigma: f64) -> Result<Self> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(BkwError::InvalidParam(format!("sigma must be positive, got {sigma}")));
        }
        let tail = (6.0 * sigma).ceil() as i64;
        let two_sigma_sq = 2.0 * sigma * sigma;

        let mut cdf = Vec::with_capacity((2 * tail + 1) as usize);
        let mut cumulative = 0.0f64;
        for x in -tail..=tail {
            cumulative += (-((x * x) as f64) / two_sigma_sq).exp();
            cdf.push(cumulative);
        }
        let total = cumulative;
        for c in cdf.iter_mut() {
            *c /= total;
        }
        Ok(Self { tail, cdf })
    }

    pub fn tail(&self) -> i64 {
        self.tail
    }

    /// Draw one value in [-tail, tail].
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        let u: f64 = rng.random::<f64>();
        let i = self.cdf.partition_point(|&c| c <= u).min(self.cdf.len() - 1);
        i as i64 - self.tail
    }
}
