/// Modular addition: (a + b) mod q, assumes a, b < q
#[inline(always)]
pub fn mod_add(a: u16, b: u16, q: u16) -> u16 {
    let sum = a as u32 + b as u32;
    if sum >= q as u32 { (sum - q as u32) as u16 } else { sum as u16 }
}

/// Modular subtraction: (a - b) mod q, assumes a, b < q
#[inline(always)]
pub fn mod_sub(a: u16, b: u16, q: u16) -> u16 {
    if a >= b {
        a - b
    } else {
        ((q as u32 - b as u32) + a as u32) as u16
    }
}

/// Modular negation: (-a) mod q, assumes a < q
#[inline(always)]
pub fn mod_neg(a: u16, q: u16) -> u16 {
    if a == 0 { 0 } else { q - a }
}

/// 2a mod q, assumes a < q
#[inline(always)]
pub fn mod_double(a: u16, q: u16) -> u16 {
    mod_add(a, a, q)
}

/// Reduce a signed integer into [0, q).
#[inline]
pub fn to_residue(v: i64, q: u16) -> u16 {
    v.rem_euclid(q as i64) as u16
}

/// Signed representative of `a` in (-q/2, q/2].
#[inline(always)]
pub fn centered(a: u16, q: u16) -> i32 {
    if a > q / 2 { a as i32 - q as i32 } else { a as i32 }
}

/// Half-modulus used as the reference range of a fresh position: ceil(q/2).
#[inline]
pub fn half_modulus(q: u16) -> u16 {
    if q & 1 == 1 { q / 2 + 1 } else { q / 2 }
}

/// Inner product <a, s> mod q.
pub fn dot_mod(a: &[u16], s: &[u16], q: u16) -> u16 {
    let acc = a.iter()
        .zip(s.iter())
        .fold(0u64, |acc, (&x, &y)| (acc + x as u64 * y as u64) % q as u64);
    acc as u16
}
