//! Solving phase over the final reduced pool.

pub mod fwht;

pub use fwht::{error_rate, fwht, sample_to_index, solve_fwht, MAX_FWHT};
