use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use rayon::prelude::*;

use super::{partition, Collector, ReductionContext, SortedCollector, StepReport};
use crate::category::CategoryMap;
use crate::error::{BkwError, Result};
use crate::params::StepParams;
use crate::ring::mod_double;
use crate::storage::{Admission, SampleList, SampleRef, SortedSamples};

/// Double every raw sample mod q and sort it into `dst` under the first
/// step's categories.
///
/// `dst` is reset for `step0` with the input size as its estimate. Workers
/// take contiguous slices of the input and share only the destination.
pub fn times2_modq(
    ctx: &ReductionContext,
    step0: &StepParams,
    input: &SampleList,
    dst: &mut SortedSamples,
) -> Result<StepReport> {
    ctx.check_dimension(input.dimension())?;
    ctx.check_dimension(dst.dimension())?;
    dst.reset(ctx.q, step0, input.len() as u64, &ctx.config)?;

    let map = CategoryMap::new(ctx.q, ctx.n, step0)?;
    let categories = map.num_categories();
    let ranges = partition(input.len(), ctx.config.threads);
    debug!("times2 over {} samples: {} worker ranges", input.len(), ranges.len());

    let discarded = AtomicU64::new(0);
    {
        let collector = SortedCollector { map, sink: dst.sink(ctx.config.max_storage_locks) };
        let pool = ctx.thread_pool()?;
        pool.install(|| {
            ranges.into_par_iter().try_for_each(|range| {
                let dropped = double_range(ctx, input, range, &collector)?;
                discarded.fetch_add(dropped, Ordering::Relaxed);
                Ok::<(), BkwError>(())
            })
        })?;
    }

    let report = StepReport { categories, stored: dst.len(), discarded: discarded.into_inner() };
    ctx.record_discards(report.discarded);
    info!(
        "times2: {} samples into {} categories ({} per category), {} discarded",
        report.stored,
        categories,
        dst.samples_per_category(),
        report.discarded
    );
    Ok(report)
}

/// Worker body; returns the number of dropped samples.
fn double_range<C: Collector>(ctx: &ReductionContext, input: &SampleList, range: Range<usize>, collector: &C) -> Result<u64> {
    let mut scratch = vec![0u16; ctx.n];
    let mut dropped = 0u64;
    for x in range.filter_map(|i| input.get(i)) {
        if collector.is_full() {
            break;
        }
        match collector.accept(double_sample(ctx.q, &mut scratch, x))? {
            Admission::Stored => {}
            Admission::StoreFull => break,
            Admission::CategoryFull | Admission::ZeroVector => dropped += 1,
        }
    }
    Ok(dropped)
}

#[inline]
fn double_sample<'o>(q: u16, out: &'o mut [u16], x: SampleRef<'_>) -> SampleRef<'o> {
    for (o, &a) in out.iter_mut().zip(x.a) {
        *o = mod_double(a, q);
    }
    SampleRef { a: out, z: mod_double(x.z, q), error: mod_double(x.error, q) }
}
