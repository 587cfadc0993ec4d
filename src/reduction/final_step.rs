use log::{info, warn};

use super::lf2::combine_pairs;
use super::{ReductionContext, StepReport};
use crate::error::{BkwError, Result};
use crate::params::StepParams;
use crate::storage::{PoolSink, SampleList, SortedSamples};

/// Last combination: LF2 over the last sorted store into a flat pool of at
/// most `max_final` samples.
///
/// Candidates are filtered with `src_params`, the parameters `src` was sorted
/// under. Workers stop as soon as the pool is full, so `max_final` should be
/// set conservatively below the expected yield of the step; a full pool is
/// the normal way this step ends, not a failure. A pool holding fewer than
/// `config.min_final_samples` samples is reported as
/// [`BkwError::InsufficientSamples`].
pub fn final_step(
    ctx: &ReductionContext,
    src_params: &StepParams,
    src: &SortedSamples,
    max_final: usize,
) -> Result<(SampleList, StepReport)> {
    ctx.check_dimension(src.dimension())?;
    let mut pool = SampleList::with_capacity(ctx.n, max_final)?;

    let discarded = {
        let sink = PoolSink::new(&mut pool);
        combine_pairs(ctx, src_params, src, &sink)?
    };
    ctx.record_discards(discarded);

    let required = ctx.config.min_final_samples;
    if pool.len() < required {
        warn!("final step kept {} samples, need {}", pool.len(), required);
        return Err(BkwError::InsufficientSamples { got: pool.len(), required });
    }

    let report = StepReport { categories: 0, stored: pool.len() as u64, discarded };
    info!("final step: {} of at most {} samples, {} discarded", pool.len(), max_final, discarded);
    Ok((pool, report))
}
