//! Carry-shift cell.

use shiftflow::*;

use crate::ConfigurationError;

/// Internal signals of one cell.
#[derive(Debug, Clone, Copy)]
pub struct CShift {
    /// Fill bit: the sign bit in arithmetic mode when selected, else 0.
    pub carry: Signal,
    /// Straight bit when unselected.
    pub u: Signal,
    /// Shifted or fill bit when selected.
    pub v: Signal,
}

/// Emits one cell driving `q` in the current scope.
///
/// `q = (a & ~sbit) | v` where `v` is the carry for a wrapped cell outside rotation and `b & sbit` otherwise. `wrap`
/// is fixed at elaboration time.
#[allow(clippy::too_many_arguments)]
pub fn cshift(
    k: &mut ModuleBuilder, q: Target, a: Expr, b: Expr, sbit: Expr, msb: Expr, asr: bool, rotate: bool, wrap: bool,
) -> Result<CShift, ConfigurationError> {
    let carry = k.declare_bit("carry", Direction::Internal)?;
    let u = k.declare_bit("u", Direction::Internal)?;
    let v = k.declare_bit("v", Direction::Internal)?;

    let carry_expr = if asr { sbit.clone() & msb } else { Expr::from(false) };
    k.comb(vec![Statement::assign(carry.target(), carry_expr)]);

    let v_expr = if !rotate && wrap { carry.expr() } else { b & sbit.clone() };
    k.comb(vec![Statement::assign(u.target(), a & !sbit), Statement::assign(v.target(), v_expr)]);

    k.comb(vec![Statement::assign(q, u.expr() | v.expr())]);

    tracing::trace!(asr, rotate, wrap, "cell");
    Ok(CShift { carry, u, v })
}
