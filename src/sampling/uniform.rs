use rand::Rng;

/// Fill `out` with residues drawn uniformly from [0, q).
pub fn fill_uniform<R: Rng>(out: &mut [u16], q: u16, rng: &mut R) {
    for x in out.iter_mut() {
        *x = rng.random_range(0..q);
    }
}

/// A vector of `n` uniform residues mod q.
pub fn sample_uniform_vec<R: Rng>(n: usize, q: u16, rng: &mut R) -> Vec<u16> {
    let mut v = vec![0u16; n];
    fill_uniform(&mut v, q, rng);
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_uniform() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let q = 101u16;
        let v = sample_uniform_vec(20_000, q, &mut rng);
        assert!(v.iter().all(|&x| x < q));
        // every residue shows up
        let mut hit = vec![false; q as usize];
        for &x in &v {
            hit[x as usize] = true;
        }
        assert!(hit.iter().all(|&h| h));
    }
}
