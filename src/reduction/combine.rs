use crate::params::StepParams;
use crate::ring::{centered, ModQ};
use crate::storage::SampleRef;

/// `x - y` coordinatewise mod q, written into `out`.
///
/// The error terms are combined the same way so the result stays checkable
/// against the secret.
#[inline]
pub fn subtract_samples<'o>(arith: &ModQ, out: &'o mut [u16], x: SampleRef<'_>, y: SampleRef<'_>) -> SampleRef<'o> {
    for ((o, &a), &b) in out.iter_mut().zip(x.a).zip(y.a) {
        *o = arith.sub(a, b);
    }
    SampleRef { a: out, z: arith.sub(x.z, y.z), error: arith.sub(x.error, y.error) }
}

/// `x + y` coordinatewise mod q, written into `out`.
#[inline]
pub fn add_samples<'o>(arith: &ModQ, out: &'o mut [u16], x: SampleRef<'_>, y: SampleRef<'_>) -> SampleRef<'o> {
    for ((o, &a), &b) in out.iter_mut().zip(x.a).zip(y.a) {
        *o = arith.add(a, b);
    }
    SampleRef { a: out, z: arith.add(x.z, y.z), error: arith.add(x.error, y.error) }
}

/// Unnatural selection: every coordinate already eliminated by `params`
/// or an earlier step must have centered magnitude at most the step's bound.
///
/// Always true when the step carries no bound.
#[inline]
pub fn passes_unnatural_selection(q: u16, a: &[u16], params: &StepParams) -> bool {
    let Some(bound) = params.selection_bound else {
        return true;
    };
    let end = params.eliminated_end().min(a.len());
    a[..end].iter().all(|&x| centered(x, q).unsigned_abs() <= bound as u32)
}
