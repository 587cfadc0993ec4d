pub mod modular;
pub mod tables;

pub use modular::{centered, half_modulus, mod_add, mod_double, mod_neg, mod_sub, to_residue};
pub use tables::{ModQ, SumDiffTables};
