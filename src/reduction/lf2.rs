//! LF2 pairing shared by the reduction and final steps.
//!
//! Categories are taken in adjacent pairs holding mutually negated samples.
//! For each pair the worker emits the differences inside each category and
//! the sums across the two. With an odd category count, category 0 is
//! unpaired and handled serially before the parallel pass.

use std::ops::{ControlFlow, Range};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use rayon::prelude::*;

use super::combine::{add_samples, passes_unnatural_selection, subtract_samples};
use super::{partition, Collector, ReductionContext};
use crate::category::is_smooth_lms_singleton;
use crate::error::Result;
use crate::params::StepParams;
use crate::storage::{Admission, SampleRef, SortedSamples};

/// Combine every admissible pair of `src` into `collector`; returns the
/// number of discarded candidates.
pub(crate) fn combine_pairs<C: Collector>(
    ctx: &ReductionContext,
    src_params: &StepParams,
    src: &SortedSamples,
    collector: &C,
) -> Result<u64> {
    let num_categories = src.num_categories();
    let base = usize::from(is_smooth_lms_singleton(0, num_categories));

    let mut discarded = 0u64;
    if base == 1 {
        let mut worker = Lf2Worker::new(ctx, src_params, src, collector);
        let flow = worker.within(0)?;
        discarded += worker.discarded;
        if flow.is_break() {
            debug!("lf2 destination filled by the singleton category");
            return Ok(discarded);
        }
    }

    let ranges = partition((num_categories - base) / 2, ctx.config.threads);
    debug!("lf2 over {num_categories} categories: {} worker ranges, singleton pre-pass: {}", ranges.len(), base == 1);

    let counted = AtomicU64::new(0);
    let pool = ctx.thread_pool()?;
    pool.install(|| {
        ranges.into_par_iter().try_for_each(|pairs| {
            let mut worker = Lf2Worker::new(ctx, src_params, src, collector);
            let result = worker.run(pairs, base);
            counted.fetch_add(worker.discarded, Ordering::Relaxed);
            result
        })
    })?;

    Ok(discarded + counted.into_inner())
}

struct Lf2Worker<'s, C> {
    q: u16,
    ctx: &'s ReductionContext,
    src_params: &'s StepParams,
    src: &'s SortedSamples,
    collector: &'s C,
    scratch: Vec<u16>,
    discarded: u64,
}

#[derive(Clone, Copy)]
enum Op {
    Diff,
    Sum,
}

impl<'s, C: Collector> Lf2Worker<'s, C> {
    fn new(ctx: &'s ReductionContext, src_params: &'s StepParams, src: &'s SortedSamples, collector: &'s C) -> Self {
        Self {
            q: ctx.q,
            ctx,
            src_params,
            src,
            collector,
            scratch: vec![0u16; ctx.n],
            discarded: 0,
        }
    }

    fn run(&mut self, pairs: Range<usize>, base: usize) -> Result<()> {
        for k in pairs {
            if self.collector.is_full() {
                break;
            }
            let first = base + 2 * k;
            if self.pair(first, first + 1)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    fn pair(&mut self, first: usize, second: usize) -> Result<ControlFlow<()>> {
        if self.within(first)?.is_break() || self.within(second)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        self.across(first, second)
    }

    /// Differences of all sample pairs i < j inside one category.
    fn within(&mut self, category: usize) -> Result<ControlFlow<()>> {
        let src = self.src;
        for (i, x) in src.category(category).enumerate() {
            for y in src.category(category).skip(i + 1) {
                if self.offer(Op::Diff, x, y)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Sums of every sample of `first` with every sample of `second`.
    fn across(&mut self, first: usize, second: usize) -> Result<ControlFlow<()>> {
        let src = self.src;
        for x in src.category(first) {
            for y in src.category(second) {
                if self.offer(Op::Sum, x, y)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn offer(&mut self, op: Op, x: SampleRef<'_>, y: SampleRef<'_>) -> Result<ControlFlow<()>> {
        let arith = &self.ctx.arith;
        let candidate = match op {
            Op::Diff => subtract_samples(arith, &mut self.scratch, x, y),
            Op::Sum => add_samples(arith, &mut self.scratch, x, y),
        };
        if candidate.is_zero() || !passes_unnatural_selection(self.q, candidate.a, self.src_params) {
            self.discarded += 1;
            return Ok(ControlFlow::Continue(()));
        }
        match self.collector.accept(candidate)? {
            Admission::Stored => Ok(ControlFlow::Continue(())),
            Admission::StoreFull => Ok(ControlFlow::Break(())),
            Admission::CategoryFull | Admission::ZeroVector => {
                self.discarded += 1;
                Ok(ControlFlow::Continue(()))
            }
        }
    }
}
