//! Utility
#[macro_use]
mod binary_search;
pub(crate) mod bitscan;
pub mod fastdiv;
pub(crate) mod sort;

pub use self::fastdiv::CellDivisor;
