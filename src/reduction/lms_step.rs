use log::{info, warn};

use super::lf2::combine_pairs;
use super::{ReductionContext, SortedCollector, StepReport};
use crate::category::CategoryMap;
use crate::error::Result;
use crate::params::StepParams;
use crate::storage::SortedSamples;

/// One smooth-LMS reduction step.
///
/// Combines the samples of `src` (sorted under `src_params`) pairwise with
/// LF2 and sorts the results into `dst` under `dst_params`. `dst` is reset
/// first, with the source size as its estimate; the step stops early once
/// `dst` reaches its sample ceiling.
pub fn reduce_step(
    ctx: &ReductionContext,
    src_params: &StepParams,
    dst_params: &StepParams,
    src: &SortedSamples,
    dst: &mut SortedSamples,
) -> Result<StepReport> {
    ctx.check_dimension(src.dimension())?;
    ctx.check_dimension(dst.dimension())?;
    dst.reset(ctx.q, dst_params, src.len(), &ctx.config)?;

    let map = CategoryMap::new(ctx.q, ctx.n, dst_params)?;
    let categories = map.num_categories();

    let discarded = {
        let collector = SortedCollector { map, sink: dst.sink(ctx.config.max_storage_locks) };
        combine_pairs(ctx, src_params, src, &collector)?
    };

    let report = StepReport { categories, stored: dst.len(), discarded };
    ctx.record_discards(discarded);
    if dst.is_empty() {
        warn!("reduction into step at {} produced no samples", dst_params.start_index);
    }
    info!(
        "reduce {}..{} -> {} categories: {} samples, {} discarded",
        src_params.start_index,
        src_params.eliminated_end(),
        categories,
        report.stored,
        report.discarded
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lwe::LweInstance;
    use crate::params::presets::toy_n10_q101;
    use crate::params::{ReductionConfig, ReductionConfigBuilder};
    use crate::reduction::times2_modq;
    use crate::ring::centered;

    fn sorted_input(seed: u64, samples: usize, config: &ReductionConfig) -> (LweInstance, ReductionContext, SortedSamples) {
        let preset = toy_n10_q101().unwrap();
        let mut lwe = LweInstance::new(preset.n, preset.q, preset.alpha, seed).unwrap();
        let input = lwe.generate_samples(samples).unwrap();
        let ctx = ReductionContext::new(preset.n, preset.q, config.clone()).unwrap();
        let step0 = preset.schedule.step(0).unwrap();
        let mut store = SortedSamples::allocate(preset.n, preset.q, step0, 0, 576, config).unwrap();
        times2_modq(&ctx, step0, &input, &mut store).unwrap();
        (lwe, ctx, store)
    }

    #[test]
    fn test_first_reduction_shrinks_block() {
        let preset = toy_n10_q101().unwrap();
        let config = ReductionConfig::default();
        let (lwe, ctx, src) = sorted_input(21, 4000, &config);
        let (s0, s1) = (preset.schedule.step(0).unwrap(), preset.schedule.step(1).unwrap());
        let mut dst = SortedSamples::allocate(preset.n, preset.q, s1, 0, 576, &config).unwrap();

        let report = reduce_step(&ctx, s0, s1, &src, &mut dst).unwrap();
        assert_eq!(report.categories, 504);
        assert!(report.stored > 0);
        assert!(dst.len() <= dst.max_samples());
        assert_eq!(lwe.verify_sorted(&dst), 0);

        // positions 0 and 1 fall into bins of width 9, position 2 into width 30
        for s in dst.iter() {
            assert!(centered(s.a[0], preset.q).abs() < 9);
            assert!(centered(s.a[1], preset.q).abs() < 9);
            assert!(centered(s.a[2], preset.q).abs() < 30);
            assert!(!s.is_zero());
        }
    }

    #[test]
    fn test_reduction_multithreaded_capacity() {
        let preset = toy_n10_q101().unwrap();
        let config = ReductionConfigBuilder::new()
            .threads(4)
            .samples_per_category(3)
            .growth_factor(0.0)
            .max_storage_locks(5)
            .build()
            .unwrap();
        let (lwe, ctx, src) = sorted_input(8, 6000, &config);
        let (s0, s1) = (preset.schedule.step(0).unwrap(), preset.schedule.step(1).unwrap());
        let mut dst = SortedSamples::allocate(preset.n, preset.q, s1, 0, 576, &config).unwrap();

        reduce_step(&ctx, s0, s1, &src, &mut dst).unwrap();
        assert!(dst.len() <= src.len());
        assert!((0..dst.num_categories()).all(|c| dst.category_len(c) <= 3));
        let stored: usize = (0..dst.num_categories()).map(|c| dst.category_len(c)).sum();
        assert_eq!(stored as u64, dst.len());
        assert_eq!(lwe.verify_sorted(&dst), 0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let preset = toy_n10_q101().unwrap();
        let config = ReductionConfig::default();
        let (_, ctx, src) = sorted_input(1, 100, &config);
        let s1 = preset.schedule.step(1).unwrap();
        let mut other = SortedSamples::allocate(12, preset.q, s1, 0, 0, &config).unwrap();
        assert!(reduce_step(&ctx, preset.schedule.step(0).unwrap(), s1, &src, &mut other).is_err());
    }
}
