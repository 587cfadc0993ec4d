use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use smooth_bkw::category::lms::{cardinality, generalized_index, partner_category, reflect};
use smooth_bkw::category::{num_categories, CategoryMap};
use smooth_bkw::lwe::LweInstance;
use smooth_bkw::params::presets::toy_n10_q101;
use smooth_bkw::params::{ReductionConfig, ReductionConfigBuilder, StepKind, StepParams};
use smooth_bkw::reduction::{
    add_samples, passes_unnatural_selection, reduce_step, subtract_samples, times2_modq, Pipeline, ReductionContext,
};
use smooth_bkw::ring::ModQ;
use smooth_bkw::sampling::sample_uniform_vec;
use smooth_bkw::storage::{Admission, SampleList, SampleRef, SortedSamples};

fn all_tuples(c: &[usize]) -> Vec<Vec<usize>> {
    c.iter().fold(vec![Vec::new()], |acc, &ci| {
        acc.into_iter()
            .flat_map(|prefix| {
                (0..ci).map(move |t| {
                    let mut next = prefix.clone();
                    next.push(t);
                    next
                })
            })
            .collect()
    })
}

fn first_step(num_positions: usize, p: u16, p1: u16) -> StepParams {
    StepParams {
        start_index: 0,
        num_positions,
        p,
        p1,
        p2: p,
        prev_p1: None,
        selection_bound: None,
    }
}

fn stores_for_toy(seed: u64, samples: usize, config: ReductionConfig) -> (LweInstance, ReductionContext, SortedSamples, SortedSamples) {
    let preset = toy_n10_q101().unwrap();
    let mut lwe = LweInstance::new(preset.n, preset.q, preset.alpha, seed).unwrap();
    let input = lwe.generate_samples(samples).unwrap();
    let ctx = ReductionContext::new(preset.n, preset.q, config).unwrap();
    let (s0, s1) = (preset.schedule.step(0).unwrap(), preset.schedule.step(1).unwrap());
    let mut src = SortedSamples::allocate(preset.n, preset.q, s0, 0, 576, ctx.config()).unwrap();
    times2_modq(&ctx, s0, &input, &mut src).unwrap();
    let dst = SortedSamples::allocate(preset.n, preset.q, s1, 0, 576, ctx.config()).unwrap();
    (lwe, ctx, src, dst)
}

#[test]
fn golden_single_position_tables() {
    let golden: [(usize, &[usize]); 4] = [
        (3, &[0, 1, 2]),
        (4, &[0, 2, 3, 1]),
        (5, &[0, 1, 3, 4, 2]),
        (6, &[0, 2, 4, 5, 3, 1]),
    ];
    for (c, expected) in golden {
        let got: Vec<usize> = (0..c).map(|t| generalized_index(&[t], &[c])).collect();
        assert_eq!(got, expected, "c = {c}");
    }
}

#[test]
fn toy_schedule_maps_every_fresh_tuple_in_range() {
    let preset = toy_n10_q101().unwrap();
    let step0 = preset.schedule.step(0).unwrap();
    let map = CategoryMap::new(preset.q, preset.n, step0).unwrap();
    let mut seen = vec![false; map.num_categories()];
    for a in 0..preset.q {
        for b in 0..preset.q {
            for c in 0..preset.q {
                seen[map.index(&[a, b, c]).unwrap()] = true;
            }
        }
    }
    assert!(seen.iter().all(|&s| s));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_generalized_index_is_bijection(c in prop::collection::vec(1usize..8, 1..4)) {
        let total: usize = c.iter().product();
        let ids: HashSet<usize> = all_tuples(&c).iter().map(|t| generalized_index(t, &c)).collect();
        prop_assert_eq!(ids.len(), total);
        prop_assert!(ids.iter().all(|&id| id < total));
    }

    #[test]
    fn prop_reflected_tuple_is_partner(c in prop::collection::vec(1usize..8, 1..4)) {
        let total: usize = c.iter().product();
        for t in all_tuples(&c) {
            let id = generalized_index(&t, &c);
            let mirrored: Vec<usize> = t.iter().zip(&c).map(|(&ti, &ci)| reflect(ti, ci)).collect();
            let mirror_id = generalized_index(&mirrored, &c);
            match partner_category(id, total) {
                Some(partner) => prop_assert_eq!(mirror_id, partner),
                None => prop_assert_eq!(mirror_id, id),
            }
        }
    }

    #[test]
    fn prop_first_step_mapping_matches_count(
        half in 5u16..20,
        p in 2u16..8,
        p1 in 2u16..12,
        len in 1usize..3,
    ) {
        let q = 2 * half + 1;
        let n = len + 1;
        let step = first_step(len, p, p1);
        let map = CategoryMap::new(q, n, &step).unwrap();
        let count = num_categories(q, n, &step).unwrap();
        prop_assert_eq!(map.num_categories(), count);

        let mut seen = vec![false; count];
        let mut pn = vec![0u16; n];
        let cells = (q as usize).pow(n as u32);
        for mut cell in 0..cells {
            for x in pn.iter_mut() {
                *x = (cell % q as usize) as u16;
                cell /= q as usize;
            }
            seen[map.index(&pn).unwrap()] = true;
        }
        prop_assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn prop_middle_step_mapping_matches_count(
        half in 5u16..16,
        prev_p1 in 2u16..17,
        p2 in 2u16..8,
        p in 2u16..8,
        p1 in 2u16..12,
        len in 1usize..3,
    ) {
        let q = 2 * half + 1;
        let prev_p1 = prev_p1.min(half + 1);
        let n = len + 1;
        let step = StepParams { prev_p1: Some(prev_p1), p2, ..first_step(len, p, p1) };
        prop_assert_eq!(step.kind(n), StepKind::Middle);
        let map = CategoryMap::new(q, n, &step).unwrap();
        let count = num_categories(q, n, &step).unwrap();
        prop_assert_eq!(map.num_categories(), count);

        // position 0 was reduced to |x| < prev_p1 by the previous step
        let reduced: Vec<u16> = (0..q).filter(|&x| x < prev_p1 || q - x < prev_p1).collect();
        let mut seen = vec![false; count];
        let mut pn = vec![0u16; n];
        let fresh_cells = (q as usize).pow(len as u32);
        for &x0 in &reduced {
            pn[0] = x0;
            for mut cell in 0..fresh_cells {
                for x in pn[1..].iter_mut() {
                    *x = (cell % q as usize) as u16;
                    cell /= q as usize;
                }
                seen[map.index(&pn).unwrap()] = true;
            }
        }
        prop_assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn prop_combination_is_coordinatewise(
        seed in any::<u64>(),
        half in 1u16..200,
        n in 1usize..20,
        tables in any::<bool>(),
    ) {
        let q = 2 * half + 1;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let xa = sample_uniform_vec(n, q, &mut rng);
        let ya = sample_uniform_vec(n, q, &mut rng);
        let x = SampleRef { a: &xa, z: xa[0], error: ya[0] };
        let y = SampleRef { a: &ya, z: ya[n - 1], error: xa[n - 1] };
        let arith = if tables { ModQ::with_tables(q).unwrap() } else { ModQ::plain(q) };
        let (q32, mut out) = (q as u32, vec![0u16; n]);

        let d = subtract_samples(&arith, &mut out, x, y);
        for i in 0..n {
            prop_assert_eq!(d.a[i] as u32, (xa[i] as u32 + q32 - ya[i] as u32) % q32);
        }
        prop_assert_eq!(d.z as u32, (x.z as u32 + q32 - y.z as u32) % q32);

        let s = add_samples(&arith, &mut out, x, y);
        for i in 0..n {
            prop_assert_eq!(s.a[i] as u32, (xa[i] as u32 + ya[i] as u32) % q32);
        }
        prop_assert_eq!(s.z as u32, (x.z as u32 + y.z as u32) % q32);
    }

    #[test]
    fn prop_self_difference_never_stored(seed in any::<u64>()) {
        let preset = toy_n10_q101().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = sample_uniform_vec(preset.n, preset.q, &mut rng);
        let x = SampleRef { a: &a, z: 5, error: 0 };
        let mut out = vec![0u16; preset.n];
        let diff = subtract_samples(&ModQ::plain(preset.q), &mut out, x, x);
        prop_assert!(diff.is_zero());

        let step0 = preset.schedule.step(0).unwrap();
        let mut store = SortedSamples::allocate(preset.n, preset.q, step0, 100, 0, &ReductionConfig::default()).unwrap();
        prop_assert_eq!(store.insert(0, diff).unwrap(), Admission::ZeroVector);
        let sink = store.sink(4);
        prop_assert_eq!(sink.insert(0, diff).unwrap(), Admission::ZeroVector);
        drop(sink);
        prop_assert_eq!(store.len(), 0);
    }

    #[test]
    fn prop_disabled_filter_accepts_nonzero(
        seed in any::<u64>(),
        start in 0usize..6,
        len in 1usize..4,
    ) {
        let q = 101;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = sample_uniform_vec(10, q, &mut rng);
        let step = StepParams { start_index: start, prev_p1: Some(17), ..first_step(len, 9, 17) };
        prop_assert!(passes_unnatural_selection(q, &a, &step));
    }

    #[test]
    fn prop_capacity_holds_under_contention(
        seed in any::<u64>(),
        threads in 4usize..9,
        cap in 2usize..5,
        locks in 1usize..16,
    ) {
        let config = ReductionConfigBuilder::new()
            .threads(threads)
            .samples_per_category(cap)
            .growth_factor(0.0)
            .max_storage_locks(locks)
            .build()
            .unwrap();
        let preset = toy_n10_q101().unwrap();
        let (lwe, ctx, src, mut dst) = stores_for_toy(seed, 3000, config);
        let (s0, s1) = (preset.schedule.step(0).unwrap(), preset.schedule.step(1).unwrap());

        let report = reduce_step(&ctx, s0, s1, &src, &mut dst).unwrap();
        prop_assert_eq!(report.stored, dst.len());
        prop_assert!(dst.len() <= dst.max_samples());
        prop_assert!((0..dst.num_categories()).all(|c| dst.category_len(c) <= cap));
        let stored: usize = (0..dst.num_categories()).map(|c| dst.category_len(c)).sum();
        prop_assert_eq!(stored as u64, dst.len());
        prop_assert!(dst.iter().all(|s| !s.is_zero()));
        prop_assert_eq!(lwe.verify_sorted(&dst), 0);
    }
}

#[test]
fn cardinality_of_toy_positions() {
    assert_eq!(cardinality(51, 9), 12);
    assert_eq!(cardinality(51, 30), 4);
    assert_eq!(cardinality(30, 9), 7);
    assert_eq!(cardinality(17, 3), 11);
}

fn run_toy(seed: u64) -> (LweInstance, SampleList, Vec<u64>, Vec<(usize, usize)>) {
    let preset = toy_n10_q101().unwrap();
    let mut lwe = LweInstance::new(preset.n, preset.q, preset.alpha, seed).unwrap();
    let input = lwe.generate_samples(preset.initial_samples).unwrap();
    // one worker keeps every step sequential, so counts are reproducible
    let config = ReductionConfigBuilder::new().threads(1).build().unwrap();
    let ctx = ReductionContext::new(preset.n, preset.q, config).unwrap();
    let pipeline = Pipeline::new(&ctx, &preset.schedule).unwrap();

    let mut stages = Vec::new();
    let out = pipeline
        .run_observed(&input, preset.final_samples, |step, store| {
            stages.push((step, lwe.verify_sorted(store)));
        })
        .unwrap();
    let stored = out.reports.iter().map(|r| r.stored).collect();
    (lwe, out.pool, stored, stages)
}

#[test]
fn toy_pipeline_reproduces_recorded_counts() {
    let preset = toy_n10_q101().unwrap();
    let (lwe, pool, stored, stages) = run_toy(0x5eed);
    let (_, again, stored_again, _) = run_toy(0x5eed);

    assert_eq!(stored, vec![3439, 2913, 1728, 816, 1611]);
    assert_eq!(stored_again, stored);
    assert_eq!(pool.len(), 1611);
    assert!(pool.len() <= preset.final_samples);
    assert!(pool.iter().zip(again.iter()).all(|(x, y)| x == y));

    assert_eq!(stages, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    assert_eq!(lwe.verify_list(&pool), 0);

    // every retained sample passed the last step's bound on 0..7
    let last = preset.schedule.last().unwrap();
    assert!(pool.iter().all(|s| passes_unnatural_selection(preset.q, s.a, last)));
    assert!(pool.iter().all(|s| !s.is_zero()));
}
