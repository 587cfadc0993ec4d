use crate::error::Result;
use crate::params::{Schedule, ScheduleBuilder};

/// Instance parameters paired with a reduction schedule.
#[derive(Clone, Debug)]
pub struct AttackPreset {
    pub n: usize,
    pub q: u16,
    pub alpha: f64,
    pub initial_samples: usize,
    pub final_samples: usize,
    pub schedule: Schedule,
}

/// Toy attack: n=10, q=101, alpha=0.01, four smooth-LMS steps.
///
/// Steps 0-2 cancel two positions each; step 3 cancels one and bounds all
/// eliminated coordinates to |x| <= 9 before the final combination.
pub fn toy_n10_q101() -> Result<AttackPreset> {
    let (n, q) = (10, 101);
    let schedule = ScheduleBuilder::new(n, q)
        .start_index(&[0, 2, 4, 6])
        .len_step(&[2, 2, 2, 1])
        .p(&[9, 9, 9, 9])
        .p1(&[30, 17, 17, 3])
        .prev_p1(&[None, Some(30), Some(17), Some(17)])
        .selection(&[0, 0, 0, 9])
        .build()?;
    Ok(AttackPreset {
        n,
        q,
        alpha: 0.01,
        initial_samples: 10_000,
        final_samples: 10_000,
        schedule,
    })
}

/// n=40, q=1601, alpha=0.005 with twelve steps and 16 positions left to zero.
///
/// Needs around 10^8 initial samples; not meant for tests.
pub fn n40_q1601() -> Result<AttackPreset> {
    let (n, q) = (40, 1601);
    let schedule = ScheduleBuilder::new(n, q)
        .start_index(&[0, 2, 4, 6, 9, 11, 13, 16, 19, 24, 29, 34])
        .len_step(&[2, 2, 2, 3, 2, 2, 2, 4, 4, 5, 5, 6])
        .p(&[1, 1, 1, 1, 1, 1, 1, 14, 20, 35, 53, 84])
        .p1(&[110, 15, 2, 400, 54, 8, 1, 55, 104, 800, 800, 129])
        .prev_p1(&[
            None,
            Some(110),
            Some(15),
            Some(2),
            Some(400),
            Some(54),
            Some(8),
            Some(1),
            Some(55),
            Some(104),
            Some(800),
            Some(800),
        ])
        .build()?;
    Ok(AttackPreset {
        n,
        q,
        alpha: 0.005,
        initial_samples: 100_000_000,
        final_samples: 100_000_000,
        schedule,
    })
}
