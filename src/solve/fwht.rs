use log::debug;

use crate::error::{BkwError, Result};
use crate::lwe::{binary_residue, LweInstance};
use crate::storage::SampleList;

/// Largest number of positions the transform table may cover.
pub const MAX_FWHT: usize = 35;

/// In-place fast Walsh-Hadamard transform; `data.len()` must be a power of two.
pub fn fwht(data: &mut [i64]) {
    let size = data.len();
    debug_assert!(size.is_power_of_two());
    let mut h = 1;
    while h < size {
        for block in data.chunks_mut(2 * h) {
            let (lo, hi) = block.split_at_mut(h);
            for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
                let t = *a;
                *a = t + *b;
                *b = t - *b;
            }
        }
        h *= 2;
    }
}

/// Parity pattern of the coordinates of `a`, bit i set when `a[i]` is odd
/// under the signed view.
pub fn sample_to_index(a: &[u16], q: u16) -> usize {
    a.iter().enumerate().fold(0usize, |acc, (i, &x)| {
        let signed = if x <= q / 2 { x } else { q - x };
        acc | (((signed & 1) as usize) << i)
    })
}

/// Recover the parities of the secret on `fwht_positions` coordinates
/// starting at `zero_positions`, from a pool whose earlier coordinates are
/// reduced to small values.
pub fn solve_fwht(pool: &SampleList, q: u16, zero_positions: usize, fwht_positions: usize) -> Result<Vec<u8>> {
    if fwht_positions == 0 || fwht_positions > MAX_FWHT {
        return Err(BkwError::InvalidParam(format!("fwht over {fwht_positions} positions, allowed 1..={MAX_FWHT}")));
    }
    let end = zero_positions + fwht_positions;
    if end > pool.dimension() {
        return Err(BkwError::InvalidParam(format!("fwht range ends at {end}, dimension {}", pool.dimension())));
    }
    if pool.is_empty() {
        return Err(BkwError::InsufficientSamples { got: 0, required: 1 });
    }

    let size = 1usize << fwht_positions;
    let mut table: Vec<i64> = Vec::new();
    table.try_reserve_exact(size).map_err(|_| BkwError::Allocation { bytes: 8 * size })?;
    table.resize(size, 0);

    for s in pool.iter() {
        let index = sample_to_index(&s.a[zero_positions..end], q);
        let z = if s.z > (q - 1) / 2 { s.z as i32 - q as i32 } else { s.z as i32 };
        table[index] += if z % 2 == 0 { 1 } else { -1 };
    }
    fwht(&mut table);

    let (best, peak) = table
        .iter()
        .enumerate()
        .max_by_key(|&(i, v)| (v.abs(), std::cmp::Reverse(i)))
        .map(|(i, v)| (i, v.abs()))
        .unwrap_or((0, 0));
    debug!("fwht over {size} entries: peak {peak} at {best:#x}");

    Ok((0..fwht_positions).map(|i| ((best >> i) & 1) as u8).collect())
}

/// Fraction of pool samples whose parity equation disagrees with the
/// secret's parities over `zero_positions..n`.
pub fn error_rate(lwe: &LweInstance, pool: &SampleList, zero_positions: usize) -> f64 {
    if pool.is_empty() {
        return 0.0;
    }
    let secret = lwe.binary_secret();
    let errors = pool
        .iter()
        .filter(|s| {
            let sum = s.a[zero_positions..]
                .iter()
                .zip(&secret[zero_positions..])
                .fold(0u8, |acc, (&x, &b)| acc ^ (binary_residue(x, lwe.q) & b));
            sum != binary_residue(s.z, lwe.q)
        })
        .count();
    errors as f64 / pool.len() as f64
}
