//! Verilog IR and its optimizations.

mod ir;
pub mod opt;

pub use ir::*;
