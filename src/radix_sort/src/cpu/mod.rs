//! Sequential tile kernels for multi-core hosts.
//!
//! The same pass contract as the team kernels, over disjoint tiles and
//! without shared memory or barriers.

pub mod histogram;
pub mod reposition;

pub use histogram::histogram;
pub use reposition::reposition;
