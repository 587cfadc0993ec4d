use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{BkwError, Result};
use crate::storage::sample::{Admission, SampleRef};

/// Flat, uncategorized pool of samples with a fixed capacity.
///
/// Coordinates, targets and errors live in separate contiguous buffers.
#[derive(Clone, Debug)]
pub struct SampleList {
    n: usize,
    capacity: usize,
    coords: Vec<u16>,
    targets: Vec<u16>,
    errors: Vec<u16>,
}

impl SampleList {
    pub fn with_capacity(n: usize, capacity: usize) -> Result<Self> {
        if n == 0 {
            return Err(BkwError::InvalidParam("dimension must be >= 1".into()));
        }
        let mut coords = Vec::new();
        let mut targets = Vec::new();
        let mut errors = Vec::new();
        let words = capacity.checked_mul(n).ok_or(BkwError::Allocation { bytes: usize::MAX })?;
        coords.try_reserve_exact(words)
            .and_then(|_| targets.try_reserve_exact(capacity))
            .and_then(|_| errors.try_reserve_exact(capacity))
            .map_err(|_| BkwError::Allocation { bytes: 2 * (words + 2 * capacity) })?;
        Ok(Self { n, capacity, coords, targets, errors })
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Append a sample; returns `StoreFull` once the capacity is reached.
    /// The all-zero vector is never stored.
    pub fn push(&mut self, sample: SampleRef<'_>) -> Result<Admission> {
        if sample.a.len() != self.n {
            return Err(BkwError::DimensionMismatch { expected: self.n, got: sample.a.len() });
        }
        if sample.is_zero() {
            return Ok(Admission::ZeroVector);
        }
        if self.is_full() {
            return Ok(Admission::StoreFull);
        }
        self.coords.extend_from_slice(sample.a);
        self.targets.push(sample.z);
        self.errors.push(sample.error);
        Ok(Admission::Stored)
    }

    pub fn get(&self, i: usize) -> Option<SampleRef<'_>> {
        if i >= self.len() {
            return None;
        }
        Some(SampleRef {
            a: &self.coords[i * self.n..(i + 1) * self.n],
            z: self.targets[i],
            error: self.errors[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SampleRef<'_>> + '_ {
        self.coords
            .chunks_exact(self.n)
            .zip(self.targets.iter().zip(self.errors.iter()))
            .map(|(a, (&z, &error))| SampleRef { a, z, error })
    }

    /// Release the backing memory.
    pub fn clear(&mut self) {
        self.coords = Vec::new();
        self.targets = Vec::new();
        self.errors = Vec::new();
        self.capacity = 0;
    }
}

/// Shared append handle on a [`SampleList`] for concurrent workers.
///
/// One mutex guards the write position; `is_full` is a lock-free hint
/// for early termination only.
pub struct PoolSink<'a> {
    pool: Mutex<&'a mut SampleList>,
    full: AtomicBool,
}

impl<'a> PoolSink<'a> {
    pub fn new(pool: &'a mut SampleList) -> Self {
        let full = AtomicBool::new(pool.is_full());
        Self { pool: Mutex::new(pool), full }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full.load(Ordering::Relaxed)
    }

    pub fn push(&self, sample: SampleRef<'_>) -> Result<Admission> {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        let admission = pool.push(sample)?;
        if pool.is_full() {
            self.full.store(true, Ordering::Relaxed);
        }
        Ok(admission)
    }
}
