//! Expressions, statements and blocks.

use std::ops::*;

use crate::hir::*;

/// Bit-level expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// One-bit constant.
    Const(bool),

    /// One bit of a signal.
    Bit(SignalId, usize),

    /// Whole signal.
    Signal(SignalId),

    /// Bitwise negation.
    Not(Box<Expr>),

    /// Bitwise and.
    And(Box<Expr>, Box<Expr>),

    /// Bitwise or.
    Or(Box<Expr>, Box<Expr>),

    /// Concatenation, most significant part first.
    Concat(Vec<Expr>),
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self { Expr::Const(value) }
}

impl Expr {
    /// Concatenates `exprs`, most significant part first.
    pub fn concat<I: IntoIterator<Item = Expr>>(exprs: I) -> Self { Expr::Concat(exprs.into_iter().collect()) }

    /// Returns the width of the expression, checking operand widths and bit indices on the way.
    pub fn width(&self, signals: &[SignalDecl]) -> Result<usize, ModuleError> {
        match self {
            Expr::Const(_) => Ok(1),
            Expr::Bit(id, index) => {
                let decl = lookup(signals, *id)?;
                if *index >= decl.width {
                    return Err(ModuleError::IndexOutOfRange {
                        signal: decl.name.clone(),
                        index: *index,
                        width: decl.width,
                    });
                }
                Ok(1)
            }
            Expr::Signal(id) => Ok(lookup(signals, *id)?.width),
            Expr::Not(inner) => inner.width(signals),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                let (lhs, rhs) = (lhs.width(signals)?, rhs.width(signals)?);
                if lhs != rhs {
                    return Err(ModuleError::WidthMismatch {
                        context: "binary operands".to_string(),
                        expected: lhs,
                        found: rhs,
                    });
                }
                Ok(lhs)
            }
            Expr::Concat(exprs) => exprs
                .iter()
                .try_fold(0, |acc, expr| -> Result<usize, ModuleError> { Ok(acc + expr.width(signals)?) }),
        }
    }

    /// Collects every bit the expression reads.
    pub fn reads(&self, signals: &[SignalDecl], out: &mut Vec<(SignalId, usize)>) {
        match self {
            Expr::Const(_) => {}
            Expr::Bit(id, index) => out.push((*id, *index)),
            Expr::Signal(id) => {
                let width = signals.get(id.0).map_or(0, |decl| decl.width);
                out.extend((0..width).map(|i| (*id, i)));
            }
            Expr::Not(inner) => inner.reads(signals, out),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                lhs.reads(signals, out);
                rhs.reads(signals, out);
            }
            Expr::Concat(exprs) => exprs.iter().for_each(|expr| expr.reads(signals, out)),
        }
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr { Expr::And(Box::new(self), Box::new(rhs)) }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr { Expr::Or(Box::new(self), Box::new(rhs)) }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr { Expr::Not(Box::new(self)) }
}

/// Lvalue of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Whole signal.
    Signal(SignalId),

    /// One bit of a signal.
    Bit(SignalId, usize),
}

impl Target {
    /// Returns the assigned signal.
    pub fn signal(&self) -> SignalId {
        match self {
            Target::Signal(id) | Target::Bit(id, _) => *id,
        }
    }

    /// Returns the assigned bits.
    pub fn bits(&self, signals: &[SignalDecl]) -> Result<Vec<(SignalId, usize)>, ModuleError> {
        match self {
            Target::Signal(id) => Ok((0..lookup(signals, *id)?.width).map(|i| (*id, i)).collect()),
            Target::Bit(id, index) => {
                let decl = lookup(signals, *id)?;
                if *index >= decl.width {
                    return Err(ModuleError::IndexOutOfRange {
                        signal: decl.name.clone(),
                        index: *index,
                        width: decl.width,
                    });
                }
                Ok(vec![(*id, *index)])
            }
        }
    }
}

/// Statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Assignment.
    Assign(Target, Expr),

    /// Conditional. Only allowed in clocked blocks.
    If(Expr, Vec<Statement>),
}

impl Statement {
    /// Assignment.
    pub fn assign(target: Target, expr: Expr) -> Self { Statement::Assign(target, expr) }

    /// Conditional without else branch.
    pub fn when(cond: Expr, body: Vec<Statement>) -> Self { Statement::If(cond, body) }
}

/// Clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Rising edge.
    Posedge,

    /// Falling edge.
    Negedge,
}

/// Structural block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Re-evaluated whenever any bit it reads changes.
    Comb {
        /// Scope the block was declared in.
        scope: Option<String>,

        /// Statements.
        body: Vec<Statement>,
    },

    /// Evaluated once per clock edge.
    Clocked {
        /// Scope the block was declared in.
        scope: Option<String>,

        /// Clock signal.
        clock: SignalId,

        /// Sensitive edge.
        edge: Edge,

        /// Statements.
        body: Vec<Statement>,
    },
}

impl Block {
    /// Returns the scope the block was declared in.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Block::Comb { scope, .. } | Block::Clocked { scope, .. } => scope.as_deref(),
        }
    }

    /// Returns the statements of the block.
    pub fn body(&self) -> &[Statement] {
        match self {
            Block::Comb { body, .. } | Block::Clocked { body, .. } => body,
        }
    }

    /// Returns `true` for combinational blocks.
    pub fn is_comb(&self) -> bool { matches!(self, Block::Comb { .. }) }
}

pub(crate) fn lookup(signals: &[SignalDecl], id: SignalId) -> Result<&SignalDecl, ModuleError> {
    signals.get(id.0).ok_or(ModuleError::UnknownSignal(id.0))
}
