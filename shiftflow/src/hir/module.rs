//! Module and module builder.

use std::collections::{BTreeSet, HashMap, HashSet};

use linked_hash_map::LinkedHashMap;
use thiserror::Error;

use crate::hir::*;
use crate::join_options;

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("signal `{0}` is declared twice")]
    DuplicateName(String),
    #[error("signal `{0}` has zero width")]
    ZeroWidth(String),
    #[error("`{0}` is not a one-bit clock input")]
    InvalidClock(String),
    #[error("unknown signal index {0}")]
    UnknownSignal(usize),
    #[error("bit {index} is out of range for `{signal}` of width {width}")]
    IndexOutOfRange { signal: String, index: usize, width: usize },
    #[error("width mismatch in {context}: expected {expected}, found {found}")]
    WidthMismatch { context: String, expected: usize, found: usize },
    #[error("input `{0}` is driven inside the module")]
    InputDriven(String),
    #[error("bit {bit} of `{signal}` has multiple drivers")]
    MultipleDrivers { signal: String, bit: usize },
    #[error("`{0}` is driven by both combinational and clocked blocks")]
    MixedDrivers(String),
    #[error("bit {bit} of `{signal}` is never driven")]
    Undriven { signal: String, bit: usize },
    #[error("combinational block in scope {0:?} contains a conditional")]
    ConditionalInComb(Option<String>),
}

/// Elaborated module. Immutable once built.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    signals: Vec<SignalDecl>,
    names: LinkedHashMap<String, SignalId>,
    blocks: Vec<Block>,
    registers: BTreeSet<SignalId>,
}

impl Module {
    /// Returns module name.
    pub fn name(&self) -> &str { &self.name }

    /// Returns all signal declarations, indexed by [`SignalId`].
    pub fn signals(&self) -> &[SignalDecl] { &self.signals }

    /// Returns the blocks in declaration order.
    pub fn blocks(&self) -> &[Block] { &self.blocks }

    /// Returns the declaration of `id`.
    pub fn signal(&self, id: SignalId) -> Result<&SignalDecl, ModuleError> { lookup(&self.signals, id) }

    /// Finds a signal by its fully scoped name.
    pub fn find(&self, name: &str) -> Option<Signal> {
        let id = *self.names.get(name)?;
        Some(Signal::new(id, self.signals[id.0].width))
    }

    /// Returns port handles in declaration order.
    pub fn ports(&self) -> impl Iterator<Item = (Signal, &SignalDecl)> + '_ {
        self.names
            .values()
            .map(move |id| (*id, &self.signals[id.0]))
            .filter(|(_, decl)| decl.direction.is_port())
            .map(|(id, decl)| (Signal::new(id, decl.width), decl))
    }

    /// Returns `true` if the signal is driven by a clocked block.
    pub fn is_register(&self, id: SignalId) -> bool { self.registers.contains(&id) }
}

/// Builds a [`Module`] out of signal declarations and blocks.
///
/// Generators receive the builder as `k` and declare their signals and logic through it. Names are prefixed by the
/// scopes entered with [`ModuleBuilder::enter_scope`], so nested generators can reuse local names.
#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    signals: Vec<SignalDecl>,
    names: LinkedHashMap<String, SignalId>,
    blocks: Vec<Block>,
    scopes: Vec<String>,
}

impl ModuleBuilder {
    /// Creates new module builder.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signals: Vec::new(),
            names: LinkedHashMap::new(),
            blocks: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Enters scope with given scope name.
    pub fn enter_scope(&mut self, scope_name: String) { self.scopes.push(scope_name); }

    /// Leaves scope.
    pub fn leave_scope(&mut self) { self.scopes.pop(); }

    /// Returns prefix of the inner scope.
    pub fn get_prefix(&self) -> Option<String> { join_options("_", self.scopes.iter().cloned().map(Some)) }

    /// Returns `true` if `name` is already taken in the current scope.
    pub fn is_declared(&self, name: &str) -> bool { self.names.contains_key(&self.scoped(name)) }

    fn scoped(&self, name: &str) -> String {
        join_options("_", [self.get_prefix(), Some(name.to_string())]).unwrap_or_default()
    }

    /// Declares a signal in the current scope.
    pub fn declare_signal(
        &mut self, name: &str, kind: SignalKind, direction: Direction, width: usize,
    ) -> Result<Signal, ModuleError> {
        let name = self.scoped(name);
        if width == 0 {
            return Err(ModuleError::ZeroWidth(name));
        }
        if kind == SignalKind::Clock && (width != 1 || direction != Direction::Input) {
            return Err(ModuleError::InvalidClock(name));
        }
        if self.names.contains_key(&name) {
            return Err(ModuleError::DuplicateName(name));
        }

        let id = SignalId(self.signals.len());
        let _ = self.names.insert(name.clone(), id);
        self.signals.push(SignalDecl { name, kind, direction, width });
        Ok(Signal::new(id, width))
    }

    /// Declares a clock input.
    pub fn declare_clock(&mut self, name: &str) -> Result<Signal, ModuleError> {
        self.declare_signal(name, SignalKind::Clock, Direction::Input, 1)
    }

    /// Declares a single bit.
    pub fn declare_bit(&mut self, name: &str, direction: Direction) -> Result<Signal, ModuleError> {
        self.declare_signal(name, SignalKind::Bit, direction, 1)
    }

    /// Declares a bus of `width` bits.
    pub fn declare_bus(&mut self, name: &str, direction: Direction, width: usize) -> Result<Signal, ModuleError> {
        self.declare_signal(name, SignalKind::Bus, direction, width)
    }

    /// Appends a combinational block to the current scope.
    pub fn comb(&mut self, body: Vec<Statement>) { self.blocks.push(Block::Comb { scope: self.get_prefix(), body }); }

    /// Appends a block clocked by `clock` to the current scope.
    pub fn clocked(&mut self, clock: Signal, edge: Edge, body: Vec<Statement>) -> Result<(), ModuleError> {
        let decl = lookup(&self.signals, clock.id())?;
        if decl.kind != SignalKind::Clock {
            return Err(ModuleError::InvalidClock(decl.name.clone()));
        }
        self.blocks.push(Block::Clocked { scope: self.get_prefix(), clock: clock.id(), edge, body });
        Ok(())
    }

    /// Validates the drivers of every signal and returns the module.
    pub fn build(self) -> Result<Module, ModuleError> {
        let mut drivers = HashMap::<(SignalId, usize), usize>::new();
        let mut comb_driven = HashSet::new();
        let mut registers = BTreeSet::new();

        for (index, block) in self.blocks.iter().enumerate() {
            let mut assigned = Vec::new();
            self.check_statements(block, block.body(), &mut assigned)?;

            let mut seen = HashSet::new();
            for (id, bit) in assigned {
                if !seen.insert((id, bit)) {
                    if block.is_comb() {
                        return Err(self.multiple_drivers(id, bit));
                    }
                    continue;
                }
                if drivers.insert((id, bit), index).is_some() {
                    return Err(self.multiple_drivers(id, bit));
                }
                let _ = if block.is_comb() { comb_driven.insert(id) } else { registers.insert(id) };
            }
        }

        if let Some(id) = comb_driven.iter().find(|id| registers.contains(*id)) {
            return Err(ModuleError::MixedDrivers(self.signals[id.0].name.clone()));
        }

        for (i, decl) in self.signals.iter().enumerate() {
            if decl.direction == Direction::Input {
                continue;
            }
            if let Some(bit) = (0..decl.width).find(|bit| !drivers.contains_key(&(SignalId(i), *bit))) {
                return Err(ModuleError::Undriven { signal: decl.name.clone(), bit });
            }
        }

        tracing::debug!(module = %self.name, signals = self.signals.len(), blocks = self.blocks.len(), "built module");
        Ok(Module { name: self.name, signals: self.signals, names: self.names, blocks: self.blocks, registers })
    }

    fn check_statements(
        &self, block: &Block, body: &[Statement], assigned: &mut Vec<(SignalId, usize)>,
    ) -> Result<(), ModuleError> {
        for stmt in body {
            match stmt {
                Statement::Assign(target, expr) => {
                    let decl = lookup(&self.signals, target.signal())?;
                    if decl.direction == Direction::Input {
                        return Err(ModuleError::InputDriven(decl.name.clone()));
                    }
                    let bits = target.bits(&self.signals)?;
                    let width = expr.width(&self.signals)?;
                    if bits.len() != width {
                        return Err(ModuleError::WidthMismatch {
                            context: format!("assignment to `{}`", decl.name),
                            expected: bits.len(),
                            found: width,
                        });
                    }
                    assigned.extend(bits);
                }
                Statement::If(cond, then_stmt) => {
                    if block.is_comb() {
                        return Err(ModuleError::ConditionalInComb(block.scope().map(String::from)));
                    }
                    let width = cond.width(&self.signals)?;
                    if width != 1 {
                        return Err(ModuleError::WidthMismatch {
                            context: "condition".to_string(),
                            expected: 1,
                            found: width,
                        });
                    }
                    self.check_statements(block, then_stmt, assigned)?;
                }
            }
        }
        Ok(())
    }

    fn multiple_drivers(&self, id: SignalId, bit: usize) -> ModuleError {
        ModuleError::MultipleDrivers { signal: self.signals[id.0].name.clone(), bit }
    }
}
