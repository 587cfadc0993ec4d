use log::info;

use super::{final_step, reduce_step, times2_modq, ReductionContext, StepReport};
use crate::category::count::max_categories;
use crate::error::{BkwError, Result};
use crate::params::Schedule;
use crate::storage::{SampleList, SortedSamples};

/// Runs a whole schedule: times-2 transform into the first step's
/// categories, every smooth-LMS step in order, then the final combination.
///
/// Two sorted stores are allocated once, sized for the largest category
/// count of the schedule, and swapped between steps.
pub struct Pipeline<'a> {
    ctx: &'a ReductionContext,
    schedule: &'a Schedule,
}

/// Final pool plus one report per stage (times-2, each reduction, final).
#[derive(Debug)]
pub struct PipelineOutput {
    pub pool: SampleList,
    pub reports: Vec<StepReport>,
}

impl<'a> Pipeline<'a> {
    pub fn new(ctx: &'a ReductionContext, schedule: &'a Schedule) -> Result<Self> {
        if schedule.is_empty() {
            return Err(BkwError::InvalidParam("schedule has no steps".into()));
        }
        for step in &schedule.steps {
            step.validate(ctx.n, ctx.q)?;
        }
        Ok(Self { ctx, schedule })
    }

    pub fn run(&self, input: &SampleList, max_final: usize) -> Result<PipelineOutput> {
        self.run_observed(input, max_final, |_, _| {})
    }

    /// Like [`Pipeline::run`], calling `observe(step, store)` on each sorted
    /// store once it is complete.
    pub fn run_observed<F>(&self, input: &SampleList, max_final: usize, mut observe: F) -> Result<PipelineOutput>
    where
        F: FnMut(usize, &SortedSamples),
    {
        let (ctx, steps) = (self.ctx, &self.schedule.steps);
        let capacity = max_categories(ctx.q, ctx.n, steps)?;
        info!(
            "pipeline: n = {}, q = {}, {} steps, {} input samples, largest step {} categories",
            ctx.n,
            ctx.q,
            steps.len(),
            input.len(),
            capacity
        );

        let mut reports = Vec::with_capacity(steps.len() + 1);
        let mut src = SortedSamples::allocate(ctx.n, ctx.q, &steps[0], input.len() as u64, capacity, &ctx.config)?;
        reports.push(times2_modq(ctx, &steps[0], input, &mut src)?);
        observe(0, &src);

        let mut spare: Option<SortedSamples> = None;
        for (i, pair) in steps.windows(2).enumerate() {
            let mut dst = match spare.take() {
                Some(store) => store,
                None => SortedSamples::allocate(ctx.n, ctx.q, &pair[1], src.len(), capacity, &ctx.config)?,
            };
            reports.push(reduce_step(ctx, &pair[0], &pair[1], &src, &mut dst)?);
            spare = Some(std::mem::replace(&mut src, dst));
            observe(i + 1, &src);
        }
        drop(spare);

        let (pool, report) = final_step(ctx, &steps[steps.len() - 1], &src, max_final)?;
        reports.push(report);
        info!("pipeline done: {} final samples, {} discarded overall", pool.len(), ctx.discarded());
        Ok(PipelineOutput { pool, reports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lwe::LweInstance;
    use crate::params::presets::toy_n10_q101;
    use crate::params::{ReductionConfig, ScheduleBuilder};

    #[test]
    fn test_toy_pipeline_oracle_every_stage() {
        let preset = toy_n10_q101().unwrap();
        let mut lwe = LweInstance::new(preset.n, preset.q, preset.alpha, 2024).unwrap();
        let input = lwe.generate_samples(preset.initial_samples).unwrap();
        let ctx = ReductionContext::new(preset.n, preset.q, ReductionConfig::default()).unwrap();
        let pipeline = Pipeline::new(&ctx, &preset.schedule).unwrap();

        let mut stages = Vec::new();
        let out = pipeline
            .run_observed(&input, preset.final_samples, |i, store| {
                stages.push((i, store.num_categories(), lwe.verify_sorted(store)));
            })
            .unwrap();

        assert_eq!(stages.iter().map(|s| (s.0, s.1)).collect::<Vec<_>>(), vec![(0, 576), (1, 504), (2, 288), (3, 136)]);
        assert!(stages.iter().all(|s| s.2 == 0));
        assert_eq!(out.reports.len(), 5);
        assert!(out.pool.len() > 0 && out.pool.len() <= preset.final_samples);
        assert_eq!(lwe.verify_list(&out.pool), 0);
    }

    #[test]
    fn test_rejects_schedule_for_other_dimension() {
        let ctx = ReductionContext::new(6, 101, ReductionConfig::default()).unwrap();
        let schedule = ScheduleBuilder::new(10, 101)
            .start_index(&[0, 8])
            .len_step(&[2, 2])
            .p(&[9, 9])
            .p1(&[30, 17])
            .prev_p1(&[None, Some(30)])
            .build()
            .unwrap();
        assert!(Pipeline::new(&ctx, &schedule).is_err());
    }
}
