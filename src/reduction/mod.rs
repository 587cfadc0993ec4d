//! BKW reduction: the times-2 transform, smooth-LMS reduction steps, the
//! final combination step, and a pipeline running a whole schedule.
//!
//! Every step runs on its own rayon pool of `config.threads` workers which
//! is torn down when the step returns. Source stores are read-only during a
//! step; the destination is the only shared mutable state.

pub mod combine;
pub mod final_step;
pub mod lms_step;
pub mod pipeline;
pub mod times2;

mod lf2;

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::category::CategoryMap;
use crate::error::{BkwError, Result};
use crate::lwe::MAX_N;
use crate::params::ReductionConfig;
use crate::ring::ModQ;
use crate::storage::{Admission, PoolSink, SampleRef, ShardedSink};

pub use combine::{add_samples, passes_unnatural_selection, subtract_samples};
pub use final_step::final_step;
pub use lms_step::reduce_step;
pub use pipeline::{Pipeline, PipelineOutput};
pub use times2::times2_modq;

/// Shared state of a reduction run: instance shape, arithmetic backend,
/// engine knobs and the diagnostic discard counter.
#[derive(Debug)]
pub struct ReductionContext {
    n: usize,
    q: u16,
    arith: ModQ,
    config: ReductionConfig,
    discarded: AtomicU64,
}

impl ReductionContext {
    pub fn new(n: usize, q: u16, config: ReductionConfig) -> Result<Self> {
        if n == 0 || n > MAX_N {
            return Err(BkwError::InvalidParam(format!("dimension {n} outside 1..={MAX_N}")));
        }
        if q < 3 || q & 1 == 0 {
            return Err(BkwError::InvalidParam(format!("modulus must be odd and >= 3, got {q}")));
        }
        let arith = if config.use_lookup_tables { ModQ::with_tables(q)? } else { ModQ::plain(q) };
        Ok(Self { n, q, arith, config, discarded: AtomicU64::new(0) })
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn modulus(&self) -> u16 {
        self.q
    }

    pub fn arith(&self) -> &ModQ {
        &self.arith
    }

    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    /// Candidates dropped so far across all steps run with this context.
    ///
    /// Best effort; never used for control flow.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    fn record_discards(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    fn thread_pool(&self) -> Result<ThreadPool> {
        Ok(ThreadPoolBuilder::new().num_threads(self.config.threads).build()?)
    }

    fn check_dimension(&self, got: usize) -> Result<()> {
        if got != self.n {
            return Err(BkwError::DimensionMismatch { expected: self.n, got });
        }
        Ok(())
    }
}

/// Outcome of one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Categories of the destination (0 for the flat final pool).
    pub categories: usize,
    pub stored: u64,
    pub discarded: u64,
}

/// Destination of combined samples, shared by all workers of a step.
pub(crate) trait Collector: Sync {
    /// Hint that the destination reached its ceiling.
    fn is_full(&self) -> bool;

    fn accept(&self, sample: SampleRef<'_>) -> Result<Admission>;
}

/// Categorizes each accepted sample under the destination step.
pub(crate) struct SortedCollector<'a> {
    pub(crate) map: CategoryMap,
    pub(crate) sink: ShardedSink<'a>,
}

impl Collector for SortedCollector<'_> {
    #[inline]
    fn is_full(&self) -> bool {
        self.sink.is_full()
    }

    #[inline]
    fn accept(&self, sample: SampleRef<'_>) -> Result<Admission> {
        let category = self.map.index_of_sample(sample.a)?;
        self.sink.insert(category, sample)
    }
}

impl Collector for PoolSink<'_> {
    #[inline]
    fn is_full(&self) -> bool {
        PoolSink::is_full(self)
    }

    #[inline]
    fn accept(&self, sample: SampleRef<'_>) -> Result<Admission> {
        self.push(sample)
    }
}

/// Split `0..items` into at most `workers` contiguous ranges of equal
/// length, the last one taking the remainder.
pub(crate) fn partition(items: usize, workers: usize) -> Vec<Range<usize>> {
    if items == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, items);
    let chunk = items / workers;
    (0..workers)
        .map(|w| {
            let end = if w + 1 == workers { items } else { (w + 1) * chunk };
            w * chunk..end
        })
        .collect()
}
