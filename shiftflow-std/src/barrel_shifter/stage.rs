//! Shifter stage.

use shiftflow::*;

use super::cshift::{cshift, CShift};
use super::plan::{plan_stage, Width};
use crate::ConfigurationError;

/// Signals and cells of one stage.
#[derive(Debug, Clone)]
pub struct ShifterStage {
    /// Output bits, `w[i]` drives bit `i` of the output bus.
    pub w: Vec<Signal>,
    /// Cells, indexed by output bit.
    pub cells: Vec<CShift>,
}

/// Emits one stage from `w_in` to `w_out` in the current scope.
///
/// `nmux` is the number of multiplexer groups and `sbit` the amount bit gating the stage.
#[allow(clippy::too_many_arguments)]
pub fn shifter_stage(
    k: &mut ModuleBuilder, w_in: Signal, w_out: Signal, msb: Expr, nmux: usize, sbit: Expr, asr: bool, rotate: bool,
) -> Result<ShifterStage, ConfigurationError> {
    let width = Width::new(w_in.width())?;
    if w_out.width() != width.width() {
        return Err(ConfigurationError::BusWidthMismatch { expected: width.width(), found: w_out.width() });
    }

    let wiring = plan_stage(width, nmux)?;
    let w = (0..width.width())
        .map(|i| k.declare_bit(&format!("w_{}", i), Direction::Internal))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cells = Vec::with_capacity(wiring.len());
    for cell in &wiring {
        k.enter_scope(format!("cell_{}", cell.output));
        let emitted = cshift(
            k,
            w[cell.output].target(),
            w_in.bit(cell.straight),
            w_in.bit(cell.shifted),
            sbit.clone(),
            msb.clone(),
            asr,
            rotate,
            cell.wrap,
        );
        k.leave_scope();
        cells.push(emitted?);
    }

    k.comb(vec![Statement::assign(w_out.target(), Expr::concat(w.iter().rev().map(Signal::expr)))]);

    tracing::debug!(width = width.width(), nmux, "shifter stage");
    Ok(ShifterStage { w, cells })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_by_half_group() {
        let mut k = ModuleBuilder::new("stage");
        let w_in = k.declare_bus("w_in", Direction::Input, 8).unwrap();
        let sbit = k.declare_bit("sbit", Direction::Input).unwrap();
        let w_out = k.declare_bus("w_out", Direction::Output, 8).unwrap();
        k.enter_scope("stage_1".to_string());
        let stage = shifter_stage(&mut k, w_in, w_out, w_in.bit(7), 2, sbit.expr(), false, false).unwrap();
        k.leave_scope();
        assert_eq!((stage.w.len(), stage.cells.len()), (8, 8));

        let module = k.build().unwrap();
        assert!(module.find("stage_1_w_0").is_some());
        assert!(module.find("stage_1_cell_7_carry").is_some());

        let mut sim = sim::Simulator::new(&module).unwrap();
        sim.set_u64(w_in, 0b1011_0100).unwrap();
        sim.settle();
        assert_eq!(sim.get_u64(w_out).unwrap(), 0b1011_0100);

        sim.set_u64(sbit, 1).unwrap();
        sim.settle();
        assert_eq!(sim.get_u64(w_out).unwrap(), 0b0010_1101);
    }

    #[test]
    fn rejects_mismatched_buses() {
        let mut k = ModuleBuilder::new("stage");
        let w_in = k.declare_bus("w_in", Direction::Input, 8).unwrap();
        let w_out = k.declare_bus("w_out", Direction::Output, 4).unwrap();
        let odd = k.declare_bus("odd", Direction::Input, 6).unwrap();
        let sbit = k.declare_bit("sbit", Direction::Input).unwrap();

        assert_eq!(
            shifter_stage(&mut k, w_in, w_out, w_in.bit(7), 1, sbit.expr(), false, false).unwrap_err(),
            ConfigurationError::BusWidthMismatch { expected: 8, found: 4 }
        );
        assert_eq!(
            shifter_stage(&mut k, odd, w_out, odd.bit(5), 1, sbit.expr(), false, false).unwrap_err(),
            ConfigurationError::NotPowerOfTwo { width: 6 }
        );
        assert_eq!(
            shifter_stage(&mut k, w_in, w_in, w_in.bit(7), 3, sbit.expr(), false, false).unwrap_err(),
            ConfigurationError::FaninMismatch { width: 8, fanin: 3 }
        );
    }
}
