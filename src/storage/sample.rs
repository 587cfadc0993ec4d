/// A borrowed LWE sample: coordinates `a`, target `z = <a,s> + e`, and
/// the error `e` carried along for verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleRef<'a> {
    pub a: &'a [u16],
    pub z: u16,
    pub error: u16,
}

impl SampleRef<'_> {
    /// All coordinates zero: the sample carries no information on the secret.
    pub fn is_zero(&self) -> bool {
        self.a.iter().all(|&x| x == 0)
    }
}

/// Outcome of offering a sample to a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Stored,
    /// The target category already holds its fixed capacity.
    CategoryFull,
    /// The store reached its sample ceiling.
    StoreFull,
    /// All-zero coordinate vector.
    ZeroVector,
}

impl Admission {
    pub fn is_stored(self) -> bool {
        self == Admission::Stored
    }
}
