//! Smooth LMS primitives.
//!
//! A position holding a residue `pn` is classified into one of `c` bins of
//! width `p` over the signed range (-q_, q_). Bins are laid out so that the
//! bin holding 0 is centered, and bin `t` holds the negatives of bin
//! `c - t` (odd `c`) or `c - 1 - t` (even `c`).
//!
//! The per-position bins are then numbered jointly so that a category and
//! its negation always sit next to each other: with an odd total the
//! all-zero category is 0 and pairs are (2k-1, 2k); with an even total pairs
//! are (2k, 2k+1).

use crate::error::{BkwError, Result};

/// Number of bins of width `p` needed to cover the 2·q_ - 1 values of (-q_, q_).
#[inline]
pub fn cardinality(q_ref: u16, p: u16) -> usize {
    let span = 2 * q_ref as usize - 1;
    span.div_ceil(p as usize)
}

/// Classify the residue `pn` into a local bin in [0, c).
///
/// `q_ref` is ceil(q/2) for a fresh position and the previous step's p1 for
/// a position that was already partially reduced.
#[inline]
pub fn smooth_lms_map(pn: u16, q: u16, q_ref: u16, p: u16, c: usize) -> Result<usize> {
    let (pn, q, q_ref, p, ci) = (pn as i64, q as i64, q_ref as i64, p as i64, c as i64);

    let t = if ci & 1 == 1 {
        let delta = p * (ci / 2 + 1) - q_ref;
        if pn < q_ref {
            (pn + delta) / p
        } else {
            (ci - ((q - pn) + delta) / p) % ci
        }
    } else {
        let delta = p * (ci / 2) - q_ref;
        if pn < q_ref {
            (pn + delta) / p
        } else {
            ci - 1 - ((q - pn) + delta) / p
        }
    };

    if t < 0 || t >= ci {
        return Err(BkwError::LocalValueOutOfRange { value: t, cardinality: c });
    }
    Ok(t as usize)
}

/// Joint index of the local bins `t` with cardinalities `c`.
///
/// Walks positions from the last to the first. At each position the index
/// is `offset + scale * rest`, where `rest` is the index of the remaining
/// lower positions. A value in the high half of its range flips the
/// reflection applied to every lower position; reflection is an involution
/// so a single flag suffices.
pub fn generalized_index(t: &[usize], c: &[usize]) -> usize {
    debug_assert_eq!(t.len(), c.len());
    debug_assert!(!t.is_empty());

    // product of the cardinalities below the current position
    let mut below: usize = c.iter().product();
    let mut offset = 0usize;
    let mut scale = 1usize;
    let mut reflected = false;

    for pos in (0..t.len()).rev() {
        let ci = c[pos];
        let ti = if reflected { reflect(t[pos], ci) } else { t[pos] };
        below /= ci;

        if pos == 0 {
            let leaf = if ci & 1 == 1 {
                if ti == 0 {
                    0
                } else if 2 * ti < ci {
                    2 * ti - 1
                } else {
                    2 * (ci - ti)
                }
            } else if 2 * ti < ci {
                2 * ti
            } else {
                2 * (ci - ti) - 1
            };
            return offset + scale * leaf;
        }

        if ci & 1 == 1 {
            if ti == 0 {
                continue;
            } else if 2 * ti < ci {
                offset += scale * (2 * ti - 1) * below;
                scale *= 2;
            } else {
                offset += scale * ((2 * (ci - ti) - 1) * below + 1);
                scale *= 2;
                reflected = !reflected;
            }
        } else if 2 * ti < ci {
            offset += scale * 2 * ti * below;
            scale *= 2;
        } else {
            offset += scale * (2 * (ci - ti - 1) * below + 1);
            scale *= 2;
            reflected = !reflected;
        }
    }
    offset
}

/// Local bin holding the negatives of bin `t`.
#[inline]
pub fn reflect(t: usize, c: usize) -> usize {
    if c & 1 == 1 { (c - t) % c } else { c - t - 1 }
}

/// Whether `category` is the unpaired all-zero category.
///
/// Only an odd category count has one.
pub fn is_smooth_lms_singleton(category: usize, num_categories: usize) -> bool {
    num_categories & 1 == 1 && category == 0
}

/// The category holding the negations of `category`, if any.
pub fn partner_category(category: usize, num_categories: usize) -> Option<usize> {
    if is_smooth_lms_singleton(category, num_categories) {
        return None;
    }
    let odd = num_categories & 1 == 1;
    // pairs start at 1 for an odd total and at 0 otherwise
    let first_of_pair = (category & 1 == 1) == odd;
    Some(if first_of_pair { category + 1 } else { category - 1 })
}
