//! ShiftFlow: a small structural hardware description layer that elaborates modules to Verilog.
//!
//! Modules are assembled with [`ModuleBuilder`], checked for single drivers when built, lowered to Verilog IR by
//! [`Virgen`], and can be executed cycle by cycle with [`sim::Simulator`].

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
// #![deny(single_use_lifetimes)]
// #![deny(unused_lifetimes)]
//
#![allow(clippy::needless_lifetimes)]

pub mod codegen;
pub mod hir;
pub mod sim;
pub mod utils;
pub mod vir;
pub mod virgen;

pub use hir::*;
pub use sim::{SimError, Simulator};
pub use utils::*;
pub use virgen::Virgen;
