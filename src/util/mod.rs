//! Shared utilities.

pub mod bitset;
