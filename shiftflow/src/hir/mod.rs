//! High-level IR: the structural DSL generators are written against.

mod expr;
mod module;
mod package;
mod signal;

pub use expr::*;
pub use module::*;
pub use package::*;
pub use signal::*;
