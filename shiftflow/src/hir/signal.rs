//! Signals.

use crate::hir::*;

/// Index of a declared signal in its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(pub(crate) usize);

impl SignalId {
    /// Returns the raw index.
    pub fn index(self) -> usize { self.0 }
}

/// Kind of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Clock. Always a one-bit input.
    Clock,

    /// Single bit.
    Bit,

    /// Multi-bit bus.
    Bus,
}

/// Direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Input port.
    Input,

    /// Output port.
    Output,

    /// Signal local to the module.
    Internal,
}

impl Direction {
    /// Returns `true` if the signal is a port.
    pub fn is_port(self) -> bool { !matches!(self, Direction::Internal) }
}

/// Signal declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDecl {
    /// Fully scoped name.
    pub name: String,

    /// Kind.
    pub kind: SignalKind,

    /// Direction.
    pub direction: Direction,

    /// Width in bits.
    pub width: usize,
}

/// Handle to a declared signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    id: SignalId,
    width: usize,
}

impl Signal {
    pub(crate) fn new(id: SignalId, width: usize) -> Self { Self { id, width } }

    /// Returns the signal id.
    pub fn id(&self) -> SignalId { self.id }

    /// Returns the width of the signal.
    pub fn width(&self) -> usize { self.width }

    /// Expression reading the whole signal.
    pub fn expr(&self) -> Expr { Expr::Signal(self.id) }

    /// Expression reading bit `index`.
    ///
    /// The index is checked when the module is built.
    pub fn bit(&self, index: usize) -> Expr { Expr::Bit(self.id, index) }

    /// Lvalue covering the whole signal.
    pub fn target(&self) -> Target { Target::Signal(self.id) }

    /// Lvalue covering bit `index`.
    pub fn bit_target(&self, index: usize) -> Target { Target::Bit(self.id, index) }
}
