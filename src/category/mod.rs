//! Mapping from coordinate blocks to dense category ids.

pub mod count;
pub mod lms;

use crate::error::{BkwError, Result};
use crate::params::{StepKind, StepParams, MAX_SMOOTH_LMS_POSITIONS};
use crate::ring::half_modulus;

pub use count::num_categories;
pub use lms::{generalized_index, is_smooth_lms_singleton, partner_category, smooth_lms_map};

const MAX_MAPPED: usize = MAX_SMOOTH_LMS_POSITIONS + 1;

/// Per-position (reference range, reduction factor) pairs of a step.
pub(crate) fn position_layout(q: u16, n: usize, params: &StepParams) -> Vec<(u16, u16)> {
    let fresh = half_modulus(q);
    let mut layout = Vec::with_capacity(params.num_positions + 1);
    match params.prev_p1 {
        None => {
            layout.extend((0..params.num_positions).map(|_| (fresh, params.p)));
        }
        Some(prev) => {
            layout.push((prev, params.p2));
            layout.extend((1..params.num_positions).map(|_| (fresh, params.p)));
        }
    }
    if params.kind(n) != StepKind::Last {
        layout.push((fresh, params.p1));
    }
    layout
}

/// Precomputed smooth-LMS mapping of one step.
///
/// Built once per step; `index` is then pure and shared freely across workers.
#[derive(Clone, Debug)]
pub struct CategoryMap {
    q: u16,
    start_index: usize,
    len: usize,
    q_ref: [u16; MAX_MAPPED],
    factor: [u16; MAX_MAPPED],
    card: [usize; MAX_MAPPED],
    num_categories: usize,
}

impl CategoryMap {
    pub fn new(q: u16, n: usize, params: &StepParams) -> Result<Self> {
        params.validate(n, q)?;
        let layout = position_layout(q, n, params);
        let mut map = Self {
            q,
            start_index: params.start_index,
            len: layout.len(),
            q_ref: [0; MAX_MAPPED],
            factor: [0; MAX_MAPPED],
            card: [0; MAX_MAPPED],
            num_categories: num_categories(q, n, params)?,
        };
        for (i, &(q_ref, p)) in layout.iter().enumerate() {
            map.q_ref[i] = q_ref;
            map.factor[i] = p;
            map.card[i] = lms::cardinality(q_ref, p);
        }
        Ok(map)
    }

    pub fn num_categories(&self) -> usize {
        self.num_categories
    }

    /// Coordinates read by the mapping, relative to the full sample.
    pub fn positions(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.len
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.card[..self.len]
    }

    /// Category of the block `pn` (coordinates starting at the step's start index).
    #[inline]
    pub fn index(&self, pn: &[u16]) -> Result<usize> {
        if pn.len() < self.len {
            return Err(BkwError::DimensionMismatch { expected: self.len, got: pn.len() });
        }
        let mut t = [0usize; MAX_MAPPED];
        for i in 0..self.len {
            t[i] = smooth_lms_map(pn[i], self.q, self.q_ref[i], self.factor[i], self.card[i])?;
        }
        let category = generalized_index(&t[..self.len], &self.card[..self.len]);
        if category >= self.num_categories {
            return Err(BkwError::CategoryOutOfRange { category, num_categories: self.num_categories });
        }
        Ok(category)
    }

    /// Category of a full sample vector.
    #[inline]
    pub fn index_of_sample(&self, a: &[u16]) -> Result<usize> {
        if a.len() < self.start_index {
            return Err(BkwError::DimensionMismatch { expected: self.start_index + self.len, got: a.len() });
        }
        self.index(&a[self.start_index..])
    }
}

/// Category of the coordinate block `pn` under the step `params`.
///
/// Convenience form of [`CategoryMap::index`]; prefer building the map once
/// per step on hot paths.
pub fn position_values_to_category_index(q: u16, n: usize, params: &StepParams, pn: &[u16]) -> Result<usize> {
    CategoryMap::new(q, n, params)?.index(pn)
}
