//! Generates Verilog code.

use crate::codegen::{self, gen_module, Codegen};
use crate::hir::{self, Direction, Edge, SignalDecl};
use crate::vir::*;

impl From<codegen::Module<Virgen>> for Module {
    fn from(module: codegen::Module<Virgen>) -> Self {
        Module { name: module.name, port_decls: module.ports, module_items: module.body.into_iter().flatten().collect() }
    }
}

/// Lowers the module to Verilog IR.
pub fn gen_vir_module(module: &hir::Module) -> Module { gen_module::<Virgen>(module).into() }

/// Verilog IR Generator
#[derive(Default, Debug)]
pub struct Virgen;

impl Codegen for Virgen {
    type Body = Vec<ModuleItem>;
    type Ports = Vec<PortDeclaration>;

    fn gen_port_decls(&self, module: &hir::Module) -> Vec<PortDeclaration> {
        module
            .ports()
            .map(|(signal, decl)| match decl.direction {
                Direction::Input => PortDeclaration::input(decl.width, decl.name.clone()),
                _ if module.is_register(signal.id()) => PortDeclaration::output_reg(decl.width, decl.name.clone()),
                _ => PortDeclaration::output(decl.width, decl.name.clone()),
            })
            .collect()
    }

    fn gen_declarations(&self, module: &hir::Module) -> Vec<ModuleItem> {
        let decls = module
            .signals()
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.direction == Direction::Internal)
            .map(|(i, decl)| {
                if module.is_register(hir::SignalId(i)) {
                    Declaration::reg(decl.width, decl.name.clone())
                } else {
                    Declaration::net(decl.width, decl.name.clone())
                }
            })
            .collect::<Vec<_>>();

        if decls.is_empty() {
            vec![]
        } else {
            vec![ModuleItem::Declarations(decls)]
        }
    }

    fn gen_blocks(&self, module: &hir::Module, scope: Option<&str>, blocks: &[&hir::Block]) -> Vec<ModuleItem> {
        let signals = module.signals();
        let mut conts = Vec::new();
        let mut items = Vec::new();

        for block in blocks {
            match block {
                hir::Block::Comb { body, .. } => {
                    conts.extend(body.iter().filter_map(|stmt| match stmt {
                        hir::Statement::Assign(target, expr) => {
                            Some(ContinuousAssign::new(gen_target(signals, target), gen_expr(signals, expr)))
                        }
                        // Rejected when the module is built.
                        hir::Statement::If(..) => None,
                    }));
                }
                hir::Block::Clocked { clock, edge, body, .. } => {
                    let edge = match edge {
                        Edge::Posedge => "posedge",
                        Edge::Negedge => "negedge",
                    };
                    let clock = signals.get(clock.index()).map_or("", |decl| decl.name.as_str());
                    items.push(ModuleItem::AlwaysConstruct(
                        format!("always @({} {})", edge, clock),
                        gen_statements(signals, body),
                    ));
                }
            }
        }

        if !conts.is_empty() {
            items.insert(0, ModuleItem::ContinuousAssigns(conts));
        }

        match scope {
            Some(scope) => vec![ModuleItem::Commented(
                format!("Logic of {}", scope),
                Some(format!("End logic of {}", scope)),
                items,
            )],
            None => items,
        }
    }
}

fn gen_statements(signals: &[SignalDecl], body: &[hir::Statement]) -> Vec<Statement> {
    body.iter()
        .map(|stmt| match stmt {
            hir::Statement::Assign(target, expr) => {
                Statement::nonblocking_assignment(gen_target(signals, target), gen_expr(signals, expr))
            }
            hir::Statement::If(cond, then_stmt) => {
                Statement::Conditional(gen_expr(signals, cond), gen_statements(signals, then_stmt))
            }
        })
        .collect()
}

fn gen_bit(signals: &[SignalDecl], id: hir::SignalId, index: usize) -> Expression {
    match signals.get(id.index()) {
        Some(decl) if decl.width > 1 => Expression::index(decl.name.clone(), index),
        Some(decl) => Expression::ident(decl.name.clone()),
        None => Expression::ident(format!("s{}", id.index())),
    }
}

fn gen_ident(signals: &[SignalDecl], id: hir::SignalId) -> Expression {
    Expression::ident(signals.get(id.index()).map_or_else(|| format!("s{}", id.index()), |decl| decl.name.clone()))
}

fn gen_target(signals: &[SignalDecl], target: &hir::Target) -> Expression {
    match target {
        hir::Target::Signal(id) => gen_ident(signals, *id),
        hir::Target::Bit(id, index) => gen_bit(signals, *id, *index),
    }
}

fn gen_expr(signals: &[SignalDecl], expr: &hir::Expr) -> Expression {
    match expr {
        hir::Expr::Const(value) => Expression::bit(*value),
        hir::Expr::Bit(id, index) => gen_bit(signals, *id, *index),
        hir::Expr::Signal(id) => gen_ident(signals, *id),
        hir::Expr::Not(inner) => Expression::unary(UnaryOp::Negation, gen_expr(signals, inner)),
        hir::Expr::And(lhs, rhs) => Expression::binary(BinaryOp::And, gen_expr(signals, lhs), gen_expr(signals, rhs)),
        hir::Expr::Or(lhs, rhs) => Expression::binary(BinaryOp::Or, gen_expr(signals, lhs), gen_expr(signals, rhs)),
        hir::Expr::Concat(exprs) => Expression::concat(exprs.iter().map(|expr| gen_expr(signals, expr)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{ModuleBuilder, Statement as Stmt};

    #[test]
    fn lowers_comb_and_clocked_blocks() {
        let mut k = ModuleBuilder::new("top");
        let clk = k.declare_clock("clk").unwrap();
        let ce = k.declare_bit("ce", Direction::Input).unwrap();
        let a = k.declare_bus("a", Direction::Input, 2).unwrap();
        let q = k.declare_bus("q", Direction::Output, 2).unwrap();
        k.enter_scope("swap".to_string());
        let t = k.declare_bus("t", Direction::Internal, 2).unwrap();
        k.comb(vec![Stmt::assign(t.target(), hir::Expr::concat([a.bit(0), a.bit(1) & !ce.expr()]))]);
        k.leave_scope();
        k.clocked(clk, Edge::Posedge, vec![Stmt::when(ce.expr(), vec![Stmt::assign(q.target(), t.expr())])]).unwrap();

        let verilog = gen_vir_module(&k.build().unwrap()).to_string();
        assert!(verilog.contains("module top\n"));
        assert!(verilog.contains("output reg [2-1:0] q"));
        assert!(verilog.contains("wire [2-1:0] swap_t;"));
        assert!(verilog.contains("assign swap_t = {a[0], a[1] & ~ce};"));
        assert!(verilog.contains("always @(posedge clk) begin\n    if (ce) begin\n        q <= swap_t;\n    end\nend"));
        assert!(verilog.contains("/*\n    Logic of swap\n*/"));
    }
}
