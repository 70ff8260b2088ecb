pub mod pd_arrays;
pub mod schedule;
pub mod structure;
