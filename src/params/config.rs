use crate::error::{BkwError, Result};

/// Default per-category capacity of a sorted sample store.
pub const SAMPLES_PER_CATEGORY: usize = 6;
/// Slack on top of the estimated sample count of each step.
pub const SAMPLES_INCREASE_FACTOR: f64 = 0.05;
/// Upper bound on the number of storage locks per destination store.
pub const MAX_NUM_STORAGE_MUTEXES: usize = 1000;

/// Knobs for the reduction engine that are not part of the attack schedule.
#[derive(Clone, Debug)]
pub struct ReductionConfig {
    /// Worker threads spawned per step.
    pub threads: usize,
    /// Fixed capacity of every category bucket.
    pub samples_per_category: usize,
    /// Soft ceiling of a step is `estimated * (1 + growth_factor)`.
    pub growth_factor: f64,
    /// Categories are striped over at most this many locks.
    pub max_storage_locks: usize,
    /// Use precomputed q×q sum/difference tables.
    pub use_lookup_tables: bool,
    /// The final pool must hold at least this many samples.
    pub min_final_samples: usize,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            samples_per_category: SAMPLES_PER_CATEGORY,
            growth_factor: SAMPLES_INCREASE_FACTOR,
            max_storage_locks: MAX_NUM_STORAGE_MUTEXES,
            use_lookup_tables: false,
            min_final_samples: 1,
        }
    }
}

impl ReductionConfig {
    /// Soft sample ceiling for a store expecting `estimated` samples.
    pub fn max_samples(&self, estimated: u64) -> u64 {
        estimated + (self.growth_factor * estimated as f64).ceil() as u64
    }
}

/// Builder for ReductionConfig.
pub struct ReductionConfigBuilder {
    config: ReductionConfig,
}

impl ReductionConfigBuilder {
    pub fn new() -> Self {
        Self { config: ReductionConfig::default() }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn samples_per_category(mut self, cap: usize) -> Self {
        self.config.samples_per_category = cap;
        self
    }

    pub fn growth_factor(mut self, factor: f64) -> Self {
        self.config.growth_factor = factor;
        self
    }

    pub fn max_storage_locks(mut self, locks: usize) -> Self {
        self.config.max_storage_locks = locks;
        self
    }

    pub fn use_lookup_tables(mut self, enabled: bool) -> Self {
        self.config.use_lookup_tables = enabled;
        self
    }

    pub fn min_final_samples(mut self, min: usize) -> Self {
        self.config.min_final_samples = min;
        self
    }

    pub fn build(self) -> Result<ReductionConfig> {
        let c = self.config;
        if c.threads == 0 {
            return Err(BkwError::InvalidParam("need at least one worker thread".into()));
        }
        if !(2..=u8::MAX as usize).contains(&c.samples_per_category) {
            return Err(BkwError::InvalidParam(format!(
                "samples per category must be in 2..=255, got {}",
                c.samples_per_category
            )));
        }
        if !(c.growth_factor >= 0.0 && c.growth_factor.is_finite()) {
            return Err(BkwError::InvalidParam("growth factor must be finite and >= 0".into()));
        }
        if c.max_storage_locks == 0 {
            return Err(BkwError::InvalidParam("need at least one storage lock".into()));
        }
        Ok(c)
    }
}

impl Default for ReductionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
