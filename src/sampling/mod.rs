pub mod gaussian;
pub mod uniform;

pub use gaussian::DiscreteGaussian;
pub use uniform::{fill_uniform, sample_uniform_vec};
