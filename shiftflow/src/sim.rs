//! Cycle-level simulation of elaborated modules.
//!
//! Combinational blocks are zero-delay: [`Simulator::settle`] evaluates each of them once in dependency order.
//! Clocked blocks run only on [`Simulator::edge`], reading the values from before the edge and committing all of their
//! assignments together.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use thiserror::Error;

use crate::hir::*;
use crate::utils::{bitvec_to_u64, u64_to_bitvec};

/// Simulation error.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Combinational blocks depend on each other in a cycle.
    #[error("combinational loop through `{0}`")]
    CombinationalLoop(String),
    #[error("`{0}` is not an input port")]
    NotAnInput(String),
    #[error("`{0}` is not a clock")]
    NotAClock(String),
    #[error("width mismatch driving `{signal}`: expected {expected}, found {found}")]
    WidthMismatch { signal: String, expected: usize, found: usize },
    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// Simulator state for one module.
#[derive(Debug)]
pub struct Simulator<'m> {
    module: &'m Module,
    values: Vec<Vec<bool>>,
    order: Vec<usize>,
}

impl<'m> Simulator<'m> {
    /// Creates a simulator with every bit at zero, and settles it.
    pub fn new(module: &'m Module) -> Result<Self, SimError> {
        let order = comb_order(module)?;
        let values = module.signals().iter().map(|decl| vec![false; decl.width]).collect();
        let mut sim = Self { module, values, order };
        sim.settle();
        Ok(sim)
    }

    /// Drives an input port.
    pub fn set(&mut self, signal: Signal, bits: &[bool]) -> Result<(), SimError> {
        let module = self.module;
        let decl = module.signal(signal.id())?;
        if decl.direction != Direction::Input {
            return Err(SimError::NotAnInput(decl.name.clone()));
        }
        if bits.len() != decl.width {
            return Err(SimError::WidthMismatch { signal: decl.name.clone(), expected: decl.width, found: bits.len() });
        }
        self.values[signal.id().index()].copy_from_slice(bits);
        Ok(())
    }

    /// Drives an input port with the low bits of `value`.
    pub fn set_u64(&mut self, signal: Signal, value: u64) -> Result<(), SimError> {
        self.set(signal, &u64_to_bitvec(signal.width(), value))
    }

    /// Returns the current bits of a signal, least significant first.
    pub fn get(&self, signal: Signal) -> Result<&[bool], SimError> {
        let decl = self.module.signal(signal.id())?;
        if signal.width() != decl.width {
            return Err(SimError::WidthMismatch { signal: decl.name.clone(), expected: decl.width, found: signal.width() });
        }
        Ok(&self.values[signal.id().index()])
    }

    /// Returns the current value of a signal as an integer.
    pub fn get_u64(&self, signal: Signal) -> Result<u64, SimError> { self.get(signal).map(bitvec_to_u64) }

    /// Evaluates every combinational block once, in dependency order.
    pub fn settle(&mut self) {
        let module = self.module;
        for i in 0..self.order.len() {
            let block = &module.blocks()[self.order[i]];
            for stmt in block.body() {
                if let Statement::Assign(target, expr) = stmt {
                    let bits = self.eval(expr);
                    self.write(*target, bits);
                }
            }
        }
    }

    /// Applies a clock edge: settles, runs the clocked blocks sensitive to it, commits, and settles again.
    pub fn edge(&mut self, clock: Signal, edge: Edge) -> Result<(), SimError> {
        let module = self.module;
        let decl = module.signal(clock.id())?;
        if decl.kind != SignalKind::Clock {
            return Err(SimError::NotAClock(decl.name.clone()));
        }

        self.settle();
        let mut updates = Vec::new();
        for block in module.blocks() {
            if let Block::Clocked { clock: c, edge: e, body, .. } = block {
                if *c == clock.id() && *e == edge {
                    self.exec(body, &mut updates);
                }
            }
        }
        tracing::trace!(clock = %decl.name, updates = updates.len(), "clock edge");

        for (target, bits) in updates {
            self.write(target, bits);
        }
        self.settle();
        Ok(())
    }

    /// Applies a rising edge of `clock`.
    pub fn posedge(&mut self, clock: Signal) -> Result<(), SimError> { self.edge(clock, Edge::Posedge) }

    fn exec(&self, body: &[Statement], updates: &mut Vec<(Target, Vec<bool>)>) {
        for stmt in body {
            match stmt {
                Statement::Assign(target, expr) => updates.push((*target, self.eval(expr))),
                Statement::If(cond, then_stmt) => {
                    if self.eval(cond).first().copied().unwrap_or(false) {
                        self.exec(then_stmt, updates);
                    }
                }
            }
        }
    }

    fn eval(&self, expr: &Expr) -> Vec<bool> {
        match expr {
            Expr::Const(value) => vec![*value],
            Expr::Bit(id, index) => vec![self.values[id.index()][*index]],
            Expr::Signal(id) => self.values[id.index()].clone(),
            Expr::Not(inner) => self.eval(inner).into_iter().map(|bit| !bit).collect(),
            Expr::And(lhs, rhs) => self.eval(lhs).into_iter().zip(self.eval(rhs)).map(|(l, r)| l & r).collect(),
            Expr::Or(lhs, rhs) => self.eval(lhs).into_iter().zip(self.eval(rhs)).map(|(l, r)| l | r).collect(),
            // Most significant part first, so the last part lands at bit 0.
            Expr::Concat(exprs) => exprs.iter().rev().flat_map(|expr| self.eval(expr)).collect(),
        }
    }

    fn write(&mut self, target: Target, bits: Vec<bool>) {
        match target {
            Target::Signal(id) => self.values[id.index()] = bits,
            Target::Bit(id, index) => self.values[id.index()][index] = bits[0],
        }
    }
}

/// Orders the combinational blocks so that every block runs after the blocks driving the bits it reads.
fn comb_order(module: &Module) -> Result<Vec<usize>, SimError> {
    let signals = module.signals();
    let comb = module.blocks().iter().enumerate().filter(|(_, block)| block.is_comb()).collect::<Vec<_>>();

    let mut graph = DiGraph::<usize, ()>::new();
    let mut nodes = HashMap::new();
    let mut writer = HashMap::new();
    for (index, block) in &comb {
        let node = graph.add_node(*index);
        let _ = nodes.insert(*index, node);
        for stmt in block.body() {
            if let Statement::Assign(target, _) = stmt {
                for bit in target.bits(signals)? {
                    let _ = writer.insert(bit, node);
                }
            }
        }
    }

    // Writer to reader, one edge per pair of blocks. A block reading its own output gets a self-loop.
    for (index, block) in &comb {
        let mut reads = Vec::new();
        for stmt in block.body() {
            if let Statement::Assign(_, expr) = stmt {
                expr.reads(signals, &mut reads);
            }
        }
        let node = nodes[index];
        for pred in reads.iter().filter_map(|bit| writer.get(bit).copied()).unique() {
            let _ = graph.add_edge(pred, node, ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(|node| graph[node]).collect()),
        Err(cycle) => {
            let name = module.blocks()[graph[cycle.node_id()]]
                .body()
                .iter()
                .find_map(|stmt| match stmt {
                    Statement::Assign(target, _) => signals.get(target.signal().index()).map(|decl| decl.name.clone()),
                    Statement::If(..) => None,
                })
                .unwrap_or_default();
            Err(SimError::CombinationalLoop(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_out_of_order_blocks() {
        let mut k = ModuleBuilder::new("top");
        let a = k.declare_bus("a", Direction::Input, 2).unwrap();
        let q = k.declare_bus("q", Direction::Output, 3).unwrap();
        let t = k.declare_bit("t", Direction::Internal).unwrap();
        // Declared before the block driving `t`.
        k.comb(vec![Statement::assign(q.target(), Expr::concat([t.expr(), a.expr()]))]);
        k.comb(vec![Statement::assign(t.target(), a.bit(0) & a.bit(1))]);
        let module = k.build().unwrap();

        let mut sim = Simulator::new(&module).unwrap();
        sim.set_u64(a, 0b11).unwrap();
        sim.settle();
        assert_eq!(sim.get_u64(q).unwrap(), 0b111);
        sim.set_u64(a, 0b10).unwrap();
        sim.settle();
        assert_eq!(sim.get_u64(q).unwrap(), 0b010);
    }

    #[test]
    fn register_holds_without_enable() {
        let mut k = ModuleBuilder::new("top");
        let clk = k.declare_clock("clk").unwrap();
        let ce = k.declare_bit("ce", Direction::Input).unwrap();
        let d = k.declare_bus("d", Direction::Input, 4).unwrap();
        let q = k.declare_bus("q", Direction::Output, 4).unwrap();
        k.clocked(clk, Edge::Posedge, vec![Statement::when(ce.expr(), vec![Statement::assign(q.target(), d.expr())])])
            .unwrap();
        let module = k.build().unwrap();

        let mut sim = Simulator::new(&module).unwrap();
        sim.set_u64(d, 9).unwrap();
        sim.set_u64(ce, 1).unwrap();
        sim.posedge(clk).unwrap();
        assert_eq!(sim.get_u64(q).unwrap(), 9);

        sim.set_u64(d, 3).unwrap();
        sim.set_u64(ce, 0).unwrap();
        sim.posedge(clk).unwrap();
        assert_eq!(sim.get_u64(q).unwrap(), 9);
        sim.edge(clk, Edge::Negedge).unwrap();
        assert_eq!(sim.get_u64(q).unwrap(), 9);
    }

    #[test]
    fn rejects_combinational_loop() {
        let mut k = ModuleBuilder::new("top");
        let q = k.declare_bit("q", Direction::Output).unwrap();
        let t = k.declare_bit("t", Direction::Internal).unwrap();
        k.comb(vec![Statement::assign(t.target(), !q.expr())]);
        k.comb(vec![Statement::assign(q.target(), t.expr())]);
        let module = k.build().unwrap();
        assert!(matches!(Simulator::new(&module), Err(SimError::CombinationalLoop(_))));
    }

    #[test]
    fn rejects_block_reading_its_own_output() {
        let mut k = ModuleBuilder::new("top");
        let a = k.declare_bit("a", Direction::Input).unwrap();
        let q = k.declare_bus("q", Direction::Output, 2).unwrap();
        k.comb(vec![Statement::assign(q.bit_target(0), a.expr()), Statement::assign(q.bit_target(1), q.bit(0))]);
        let module = k.build().unwrap();
        assert_eq!(Simulator::new(&module).unwrap_err(), SimError::CombinationalLoop("q".to_string()));
    }

    #[test]
    fn rejects_driving_non_inputs() {
        let mut k = ModuleBuilder::new("top");
        let a = k.declare_bit("a", Direction::Input).unwrap();
        let q = k.declare_bit("q", Direction::Output).unwrap();
        k.comb(vec![Statement::assign(q.target(), a.expr())]);
        let module = k.build().unwrap();

        let mut sim = Simulator::new(&module).unwrap();
        assert_eq!(sim.set_u64(q, 1), Err(SimError::NotAnInput("q".to_string())));
        assert!(matches!(sim.set(a, &[true, false]), Err(SimError::WidthMismatch { expected: 1, found: 2, .. })));
        assert_eq!(sim.posedge(a), Err(SimError::NotAClock("a".to_string())));
    }

    #[test]
    fn rejects_reading_foreign_signals() {
        let mut k = ModuleBuilder::new("a");
        let _ = k.declare_bit("x", Direction::Input).unwrap();
        let a = k.build().unwrap();

        let mut k = ModuleBuilder::new("b");
        let _ = k.declare_bit("x", Direction::Input).unwrap();
        let y = k.declare_bus("y", Direction::Input, 4).unwrap();
        let _ = k.build().unwrap();

        let mut k = ModuleBuilder::new("c");
        let z = k.declare_bus("z", Direction::Input, 4).unwrap();
        let _ = k.build().unwrap();

        let sim = Simulator::new(&a).unwrap();
        assert!(matches!(sim.get(y), Err(SimError::Module(ModuleError::UnknownSignal(_)))));
        assert!(sim.get_u64(y).is_err());
        // Same index as `x` in `a`, different width.
        assert!(matches!(sim.get(z), Err(SimError::WidthMismatch { expected: 1, found: 4, .. })));
    }
}
