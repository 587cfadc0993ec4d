use crate::category::lms::cardinality;
use crate::category::position_layout;
use crate::error::{BkwError, Result};
use crate::params::StepParams;

/// Exact number of categories produced by the step's mapping.
///
/// Product of the per-position cardinalities ceil((2·q_ - 1) / p), where
/// the first/last position may use p2 over the previous p1 and the extra
/// position uses p1.
pub fn num_categories(q: u16, n: usize, params: &StepParams) -> Result<usize> {
    if q & 1 == 0 {
        return Err(BkwError::InvalidParam("modulo power of 2 not handled".into()));
    }
    params.validate(n, q)?;
    position_layout(q, n, params)
        .iter()
        .try_fold(1usize, |acc, &(q_ref, p)| acc.checked_mul(cardinality(q_ref, p)))
        .ok_or_else(|| BkwError::InvalidParam("category count overflows usize".into()))
}

/// Largest category count over a set of steps.
pub fn max_categories<'a>(q: u16, n: usize, steps: impl IntoIterator<Item = &'a StepParams>) -> Result<usize> {
    steps.into_iter().try_fold(0usize, |acc, s| Ok(acc.max(num_categories(q, n, s)?)))
}
