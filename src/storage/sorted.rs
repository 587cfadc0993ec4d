use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::debug;

use crate::category::num_categories;
use crate::error::{BkwError, Result};
use crate::params::{ReductionConfig, StepParams};
use crate::storage::sample::{Admission, SampleRef};

/// Samples partitioned by category, each category holding at most
/// `samples_per_category` samples.
///
/// Backing buffers are sized once for the largest category count the store
/// will ever serve and reused across steps through [`SortedSamples::reset`].
/// Layout is struct-of-arrays: slot `s` of category `c` has its
/// coordinates at `coords[(c * cap + s) * n ..][.. n]` and its target at
/// `targets[c * cap + s]`.
#[derive(Debug)]
pub struct SortedSamples {
    n: usize,
    samples_per_category: usize,
    capacity_categories: usize,
    num_categories: usize,
    max_samples: u64,
    n_samples: u64,
    coords: Vec<u16>,
    targets: Vec<u16>,
    errors: Vec<u16>,
    occupancy: Vec<u8>,
}

impl SortedSamples {
    /// Reserve storage for `max_categories` categories and configure the
    /// store for `params`, expecting about `estimated_samples` samples.
    pub fn allocate(
        n: usize,
        q: u16,
        params: &StepParams,
        estimated_samples: u64,
        max_categories: usize,
        config: &ReductionConfig,
    ) -> Result<Self> {
        let step_categories = num_categories(q, n, params)?;
        let capacity_categories = max_categories.max(step_categories);
        let cap = config.samples_per_category;
        if !(2..=u8::MAX as usize).contains(&cap) {
            return Err(BkwError::InvalidParam(format!("samples per category must be in 2..=255, got {cap}")));
        }

        let slots = capacity_categories.checked_mul(cap).ok_or(BkwError::Allocation { bytes: usize::MAX })?;
        let words = slots.checked_mul(n).ok_or(BkwError::Allocation { bytes: usize::MAX })?;
        let bytes = 2 * (words + 2 * slots) + capacity_categories;

        let mut coords = Vec::new();
        let mut targets = Vec::new();
        let mut errors = Vec::new();
        let mut occupancy = Vec::new();
        coords.try_reserve_exact(words)
            .and_then(|_| targets.try_reserve_exact(slots))
            .and_then(|_| errors.try_reserve_exact(slots))
            .and_then(|_| occupancy.try_reserve_exact(capacity_categories))
            .map_err(|_| BkwError::Allocation { bytes })?;
        coords.resize(words, 0);
        targets.resize(slots, 0);
        errors.resize(slots, 0);
        occupancy.resize(capacity_categories, 0);

        debug!("allocated sorted store: {capacity_categories} categories x {cap} slots, {bytes} bytes");

        Ok(Self {
            n,
            samples_per_category: cap,
            capacity_categories,
            num_categories: step_categories,
            max_samples: config.max_samples(estimated_samples),
            n_samples: 0,
            coords,
            targets,
            errors,
            occupancy,
        })
    }

    /// Empty the store and configure it for `params` without touching the
    /// backing allocation.
    pub fn reset(&mut self, q: u16, params: &StepParams, estimated_samples: u64, config: &ReductionConfig) -> Result<()> {
        let required = num_categories(q, self.n, params)?;
        if required > self.capacity_categories {
            return Err(BkwError::CapacityExceeded { required, available: self.capacity_categories });
        }
        self.occupancy.iter_mut().for_each(|o| *o = 0);
        self.num_categories = required;
        self.max_samples = config.max_samples(estimated_samples);
        self.n_samples = 0;
        Ok(())
    }

    /// Release the backing memory; the store must be reallocated before reuse.
    pub fn clear(&mut self) {
        self.coords = Vec::new();
        self.targets = Vec::new();
        self.errors = Vec::new();
        self.occupancy = Vec::new();
        self.capacity_categories = 0;
        self.num_categories = 0;
        self.max_samples = 0;
        self.n_samples = 0;
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn num_categories(&self) -> usize {
        self.num_categories
    }

    pub fn capacity_categories(&self) -> usize {
        self.capacity_categories
    }

    pub fn samples_per_category(&self) -> usize {
        self.samples_per_category
    }

    pub fn max_samples(&self) -> u64 {
        self.max_samples
    }

    pub fn len(&self) -> u64 {
        self.n_samples
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }

    pub fn is_full(&self) -> bool {
        self.n_samples >= self.max_samples
    }

    /// Number of samples stored in `category`.
    pub fn category_len(&self, category: usize) -> usize {
        if category >= self.num_categories {
            return 0;
        }
        self.occupancy[category] as usize
    }

    pub fn get(&self, category: usize, slot: usize) -> Option<SampleRef<'_>> {
        if slot >= self.category_len(category) {
            return None;
        }
        let i = category * self.samples_per_category + slot;
        Some(SampleRef {
            a: &self.coords[i * self.n..(i + 1) * self.n],
            z: self.targets[i],
            error: self.errors[i],
        })
    }

    /// Samples of one category, in insertion order.
    pub fn category(&self, category: usize) -> impl Iterator<Item = SampleRef<'_>> + '_ {
        (0..self.category_len(category)).filter_map(move |slot| self.get(category, slot))
    }

    /// Every stored sample, category by category.
    pub fn iter(&self) -> impl Iterator<Item = SampleRef<'_>> + '_ {
        (0..self.num_categories).flat_map(move |c| self.category(c))
    }

    /// Single-threaded insert.
    pub fn insert(&mut self, category: usize, sample: SampleRef<'_>) -> Result<Admission> {
        self.check(category, sample)?;
        if sample.is_zero() {
            return Ok(Admission::ZeroVector);
        }
        let occupied = self.occupancy[category] as usize;
        if occupied >= self.samples_per_category {
            return Ok(Admission::CategoryFull);
        }
        if self.n_samples >= self.max_samples {
            return Ok(Admission::StoreFull);
        }
        let i = category * self.samples_per_category + occupied;
        write_slot(&mut self.coords, &mut self.targets, &mut self.errors, self.n, i, sample);
        self.occupancy[category] += 1;
        self.n_samples += 1;
        Ok(Admission::Stored)
    }

    fn check(&self, category: usize, sample: SampleRef<'_>) -> Result<()> {
        if category >= self.num_categories {
            return Err(BkwError::CategoryOutOfRange { category, num_categories: self.num_categories });
        }
        if sample.a.len() != self.n {
            return Err(BkwError::DimensionMismatch { expected: self.n, got: sample.a.len() });
        }
        Ok(())
    }

    /// Concurrent insert handle striping the categories over at most
    /// `max_locks` mutexes.
    ///
    /// The total count is committed back to the store when the sink drops.
    pub fn sink(&mut self, max_locks: usize) -> ShardedSink<'_> {
        let num_categories = self.num_categories.max(1);
        let num_locks = max_locks.clamp(1, num_categories);
        let per_shard = num_categories.div_ceil(num_locks);
        let cap = self.samples_per_category;
        let n = self.n;

        let coords = self.coords[..num_categories * cap * n].chunks_mut(per_shard * cap * n);
        let targets = self.targets[..num_categories * cap].chunks_mut(per_shard * cap);
        let errors = self.errors[..num_categories * cap].chunks_mut(per_shard * cap);
        let occupancy = self.occupancy[..num_categories].chunks_mut(per_shard);

        let shards: Vec<Mutex<Shard<'_>>> = coords
            .zip(targets)
            .zip(errors)
            .zip(occupancy)
            .map(|(((coords, targets), errors), occupancy)| Mutex::new(Shard { coords, targets, errors, occupancy }))
            .collect();

        debug!("sink over {} categories: {} locks, {} categories per lock", self.num_categories, shards.len(), per_shard);

        ShardedSink {
            n,
            samples_per_category: cap,
            num_categories: self.num_categories,
            per_shard,
            max_samples: self.max_samples,
            total: AtomicU64::new(self.n_samples),
            committed: &mut self.n_samples,
            shards,
        }
    }
}

#[inline]
fn write_slot(coords: &mut [u16], targets: &mut [u16], errors: &mut [u16], n: usize, i: usize, sample: SampleRef<'_>) {
    coords[i * n..(i + 1) * n].copy_from_slice(sample.a);
    targets[i] = sample.z;
    errors[i] = sample.error;
}

struct Shard<'a> {
    coords: &'a mut [u16],
    targets: &'a mut [u16],
    errors: &'a mut [u16],
    occupancy: &'a mut [u8],
}

/// Concurrent writer over a [`SortedSamples`] store.
///
/// Each lock owns a contiguous run of categories. The sample ceiling is
/// enforced by reserving a slot in the shared total while the category's
/// lock is held, so `len() <= max_samples` holds under any interleaving.
pub struct ShardedSink<'a> {
    n: usize,
    samples_per_category: usize,
    num_categories: usize,
    per_shard: usize,
    max_samples: u64,
    total: AtomicU64,
    committed: &'a mut u64,
    shards: Vec<Mutex<Shard<'a>>>,
}

impl<'a> ShardedSink<'a> {
    pub fn num_locks(&self) -> usize {
        self.shards.len()
    }

    pub fn len(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock-free ceiling check; a hint for early termination.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.total.load(Ordering::Relaxed) >= self.max_samples
    }

    pub fn insert(&self, category: usize, sample: SampleRef<'_>) -> Result<Admission> {
        if category >= self.num_categories {
            return Err(BkwError::CategoryOutOfRange { category, num_categories: self.num_categories });
        }
        if sample.a.len() != self.n {
            return Err(BkwError::DimensionMismatch { expected: self.n, got: sample.a.len() });
        }
        if sample.is_zero() {
            return Ok(Admission::ZeroVector);
        }

        let local = category % self.per_shard;
        let mut shard = self.shards[category / self.per_shard].lock().unwrap_or_else(PoisonError::into_inner);
        let occupied = shard.occupancy[local] as usize;
        if occupied >= self.samples_per_category {
            return Ok(Admission::CategoryFull);
        }
        let max = self.max_samples;
        let reserved = self.total.fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| (t < max).then_some(t + 1));
        if reserved.is_err() {
            return Ok(Admission::StoreFull);
        }

        let i = local * self.samples_per_category + occupied;
        let Shard { coords, targets, errors, occupancy } = &mut *shard;
        write_slot(coords, targets, errors, self.n, i, sample);
        occupancy[local] += 1;
        Ok(Admission::Stored)
    }
}

impl Drop for ShardedSink<'_> {
    fn drop(&mut self) {
        *self.committed = *self.total.get_mut();
    }
}
