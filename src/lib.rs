//! # smooth-bkw: in-memory BKW sample reduction for LWE
//!
//! Implements the reduction phase of the Blum-Kalai-Wasserman algorithm with
//! smooth-LMS categorization: samples are sorted into categories by a
//! mixed-radix, sign-interleaved index over a block of coordinates, and
//! pairs from the same or from negated categories are combined (LF2) so the
//! block shrinks to small values. After the last step the reduced pool goes
//! to a Walsh-Hadamard solver.
//!
//! ## Quick Start
//!
//! ```no_run
//! use smooth_bkw::prelude::*;
//!
//! let preset = smooth_bkw::params::presets::toy_n10_q101().unwrap();
//! let mut lwe = LweInstance::new(preset.n, preset.q, preset.alpha, 1).unwrap();
//! let samples = lwe.generate_samples(preset.initial_samples).unwrap();
//!
//! let config = ReductionConfigBuilder::new().threads(4).build().unwrap();
//! let ctx = ReductionContext::new(preset.n, preset.q, config).unwrap();
//! let out = Pipeline::new(&ctx, &preset.schedule).unwrap()
//!     .run(&samples, preset.final_samples)
//!     .unwrap();
//!
//! assert_eq!(lwe.verify_list(&out.pool), 0);
//! let guess = solve_fwht(&out.pool, preset.q, 0, preset.n).unwrap();
//! ```

pub mod error;
pub mod params;
pub mod ring;
pub mod category;
pub mod sampling;
pub mod lwe;
pub mod storage;
pub mod reduction;
pub mod solve;

/// Convenient re-exports for common types and functions.
pub mod prelude {
    pub use crate::error::{BkwError, Result};
    pub use crate::params::{ReductionConfig, ReductionConfigBuilder, Schedule, ScheduleBuilder, StepKind, StepParams};
    pub use crate::category::{num_categories, position_values_to_category_index, CategoryMap};
    pub use crate::lwe::LweInstance;
    pub use crate::storage::{Admission, SampleList, SampleRef, SortedSamples};
    pub use crate::reduction::{
        final_step, reduce_step, times2_modq, Pipeline, PipelineOutput, ReductionContext, StepReport,
    };
    pub use crate::solve::{error_rate, solve_fwht};
}
