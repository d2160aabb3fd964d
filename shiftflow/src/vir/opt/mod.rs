//! Optimizations.

mod dead_code;

pub use dead_code::*;
