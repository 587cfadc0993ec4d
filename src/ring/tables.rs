use std::sync::Arc;

use crate::error::{BkwError, Result};
use crate::ring::modular::{mod_add, mod_sub};

/// Precomputed (a + b) mod q and (a - b) mod q for all a, b < q.
///
/// Two q×q tables of u16, row-major. Only worth it for small q where both
/// tables stay cache-resident.
#[derive(Debug)]
pub struct SumDiffTables {
    q: u16,
    sum: Vec<u16>,
    diff: Vec<u16>,
}

impl SumDiffTables {
    pub fn new(q: u16) -> Result<Self> {
        if q < 2 {
            return Err(BkwError::InvalidParam("modulus must be >= 2".into()));
        }
        let len = q as usize * q as usize;
        let mut sum = Vec::new();
        let mut diff = Vec::new();
        sum.try_reserve_exact(len)
            .and_then(|_| diff.try_reserve_exact(len))
            .map_err(|_| BkwError::Allocation { bytes: 4 * len })?;

        for a in 0..q {
            for b in 0..q {
                sum.push(mod_add(a, b, q));
                diff.push(mod_sub(a, b, q));
            }
        }
        Ok(Self { q, sum, diff })
    }

    #[inline(always)]
    pub fn sum(&self, a: u16, b: u16) -> u16 {
        self.sum[a as usize * self.q as usize + b as usize]
    }

    #[inline(always)]
    pub fn diff(&self, a: u16, b: u16) -> u16 {
        self.diff[a as usize * self.q as usize + b as usize]
    }
}

/// Arithmetic in Z_q for sample combination.
///
/// Plain modular arithmetic is the reference; lookup tables are an optional
/// acceleration with identical results.
#[derive(Clone, Debug)]
pub struct ModQ {
    q: u16,
    tables: Option<Arc<SumDiffTables>>,
}

impl ModQ {
    pub fn plain(q: u16) -> Self {
        Self { q, tables: None }
    }

    pub fn with_tables(q: u16) -> Result<Self> {
        Ok(Self { q, tables: Some(Arc::new(SumDiffTables::new(q)?)) })
    }

    pub fn modulus(&self) -> u16 {
        self.q
    }

    pub fn uses_tables(&self) -> bool {
        self.tables.is_some()
    }

    #[inline(always)]
    pub fn add(&self, a: u16, b: u16) -> u16 {
        match &self.tables {
            Some(t) => t.sum(a, b),
            None => mod_add(a, b, self.q),
        }
    }

    #[inline(always)]
    pub fn sub(&self, a: u16, b: u16) -> u16 {
        match &self.tables {
            Some(t) => t.diff(a, b),
            None => mod_sub(a, b, self.q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_match_plain() {
        let q = 101u16;
        let plain = ModQ::plain(q);
        let tabled = ModQ::with_tables(q).unwrap();
        assert!(tabled.uses_tables());
        for a in 0..q {
            for b in 0..q {
                assert_eq!(plain.add(a, b), tabled.add(a, b));
                assert_eq!(plain.sub(a, b), tabled.sub(a, b));
            }
        }
    }

    #[test]
    fn test_tables_reject_tiny_modulus() {
        assert!(SumDiffTables::new(1).is_err());
    }
}
