//! Generates target code from a ShiftFlow module.

use itertools::Itertools;

use crate::hir;

/// IR-level module.
#[derive(Debug)]
pub struct Module<C: Codegen> {
    /// Name of the module
    pub name: String,

    /// Ports of the module
    pub ports: C::Ports,

    /// Body of the module, one chunk per declaration group or scope
    pub body: Vec<C::Body>,
}

/// Generates target code.
pub trait Codegen: Default {
    /// Ports of module.
    type Ports;

    /// Body of module.
    type Body;

    /// Generates target code for port declarations.
    fn gen_port_decls(&self, module: &hir::Module) -> Self::Ports;

    /// Generates target code for the declarations of internal signals.
    fn gen_declarations(&self, module: &hir::Module) -> Self::Body;

    /// Generates target code for a run of blocks declared in the same scope.
    fn gen_blocks(&self, module: &hir::Module, scope: Option<&str>, blocks: &[&hir::Block]) -> Self::Body;
}

/// Generates target code for module with given compiler.
pub fn gen_module<C: Codegen>(module: &hir::Module) -> Module<C> {
    let compiler = C::default();

    let mut body = vec![compiler.gen_declarations(module)];
    for (scope, blocks) in &module.blocks().iter().group_by(|block| block.scope()) {
        body.push(compiler.gen_blocks(module, scope, &blocks.collect::<Vec<_>>()));
    }

    Module { name: module.name().to_string(), ports: compiler.gen_port_decls(module), body }
}
