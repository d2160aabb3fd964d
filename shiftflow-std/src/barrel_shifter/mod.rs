//! Barrel shifter.
//!
//! A `2^P`-bit value is shifted right (or rotated) by a `P`-bit amount through `P` stages of carry-shift cells. Stage
//! `s` shifts by `2^(P-s-1)` when amount bit `P-s-1` is set. The last stage feeds a register updated on the rising
//! clock edge while `ce` is high.

mod cshift;
pub mod plan;
mod stage;

pub use cshift::{cshift, CShift};
pub use plan::{cshift_bit, plan_stage, BusRef, CellWiring, Mode, ShiftNetwork, StagePlan, Width, MAX_POWER};
use shiftflow::*;
pub use stage::{shifter_stage, ShifterStage};

use crate::ConfigurationError;

/// Generator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrelShifterConfig {
    /// `log2` of the data width.
    pub power: usize,
    /// Shift mode.
    pub mode: Mode,
}

impl Default for BarrelShifterConfig {
    fn default() -> Self { Self { power: 5, mode: Mode::default() } }
}

/// Ports of a barrel shifter.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy)]
pub struct BarrelShifterPorts {
    pub clk: Signal,
    /// Clock enable
    pub ce: Signal,
    /// Value, `W` bits
    pub val: Signal,
    /// Shift amount, `P` bits
    pub s: Signal,
    /// Registered result, `W` bits
    pub result: Signal,
}

/// Elaborated barrel shifter.
#[derive(Debug, Clone)]
pub struct BarrelShifter {
    /// Ports it was elaborated against.
    pub ports: BarrelShifterPorts,
    /// Plan it was elaborated from.
    pub network: ShiftNetwork,
    /// Working buses; `worker[0]` is `val` and `worker[P]` feeds the register.
    pub worker: Vec<Signal>,
    /// Emitted stages, in order.
    pub stages: Vec<ShifterStage>,
}

/// Emits a barrel shifter between the given ports.
///
/// Port widths and every internal name are checked before anything is declared, so a configuration or naming error
/// leaves `k` untouched. An error raised while emitting still leaves `k` partially populated, and `k` must then be
/// discarded.
pub fn barrel_shifter(
    k: &mut ModuleBuilder, ports: &BarrelShifterPorts, config: BarrelShifterConfig,
) -> Result<BarrelShifter, ConfigurationError> {
    let width = Width::from_power(config.power)?;
    let network = ShiftNetwork::new(width, config.mode)?;
    let (w, p) = (width.width(), width.power());

    for bus in [ports.val, ports.result] {
        if bus.width() != w {
            return Err(ConfigurationError::BusWidthMismatch { expected: w, found: bus.width() });
        }
    }
    if ports.s.width() != p {
        return Err(ConfigurationError::AmountWidthMismatch { expected: p, found: ports.s.width() });
    }

    if let Some(name) = internal_names(&network).find(|name| k.is_declared(name)) {
        return Err(ModuleError::DuplicateName(name).into());
    }

    let msb = ports.val.bit(w - 1);
    let mut worker = vec![ports.val];
    for i in 1..=p {
        worker.push(k.declare_bus(&format!("worker_{}", i), Direction::Internal, w)?);
    }

    let bus = |bus_ref: BusRef| match bus_ref {
        BusRef::Value => ports.val,
        BusRef::Worker(n) => worker[n],
    };

    let mut stages = Vec::with_capacity(p);
    for stage in network.stages() {
        k.enter_scope(format!("stage_{}", stage.index));
        let emitted = shifter_stage(
            k,
            bus(stage.input),
            bus(stage.output),
            msb.clone(),
            stage.fanin,
            ports.s.bit(stage.select_bit),
            stage.arithmetic,
            stage.rotate,
        );
        k.leave_scope();
        stages.push(emitted?);
        tracing::debug!(stage = stage.index, select_bit = stage.select_bit, distance = stage.distance, "elaborated stage");
    }

    k.clocked(ports.clk, Edge::Posedge, vec![Statement::when(ports.ce.expr(), vec![Statement::assign(
        ports.result.target(),
        worker[p].expr(),
    )])])?;

    Ok(BarrelShifter { ports: *ports, network, worker, stages })
}

/// Names declared by [`barrel_shifter`], relative to the current scope.
fn internal_names(network: &ShiftNetwork) -> impl Iterator<Item = String> + '_ {
    let w = network.width().width();
    let workers = (1..=network.width().power()).map(|i| format!("worker_{}", i));
    let stages = network.stages().iter().flat_map(move |stage| {
        (0..w).flat_map(move |i| {
            [
                format!("stage_{}_w_{}", stage.index, i),
                format!("stage_{}_cell_{}_carry", stage.index, i),
                format!("stage_{}_cell_{}_u", stage.index, i),
                format!("stage_{}_cell_{}_v", stage.index, i),
            ]
        })
    });
    workers.chain(stages)
}

/// Generates standalone barrel shifter modules.
#[derive(Debug, Clone, Default)]
pub struct BarrelShifterGenerator {
    config: BarrelShifterConfig,
}

impl BarrelShifterGenerator {
    /// Creates a generator.
    pub fn new(config: BarrelShifterConfig) -> Self { Self { config } }

    /// Options of the generator.
    pub fn config(&self) -> BarrelShifterConfig { self.config }

    /// Name of the generated module, e.g. `barrel_shifter_32_lsr`.
    pub fn module_name(&self) -> Result<String, ConfigurationError> {
        let width = Width::from_power(self.config.power)?;
        Ok(format!("barrel_shifter_{}_{}", width.width(), self.config.mode))
    }

    /// Declares the ports `clk`, `ce`, `val`, `s` and `result`, and elaborates the shifter between them.
    pub fn generate(&self) -> Result<(Module, BarrelShifter), ConfigurationError> {
        let width = Width::from_power(self.config.power)?;
        let name = self.module_name()?;
        let mut k = ModuleBuilder::new(&name);

        let ports = BarrelShifterPorts {
            clk: k.declare_clock("clk")?,
            ce: k.declare_bit("ce", Direction::Input)?,
            val: k.declare_bus("val", Direction::Input, width.width())?,
            s: k.declare_bus("s", Direction::Input, width.power())?,
            result: k.declare_bus("result", Direction::Output, width.width())?,
        };
        let shifter = barrel_shifter(&mut k, &ports, self.config)?;
        let module = k.build()?;

        tracing::info!(module = %name, width = width.width(), mode = %self.config.mode, "generated barrel shifter");
        Ok((module, shifter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let generator = BarrelShifterGenerator::default();
        assert_eq!(generator.config(), BarrelShifterConfig { power: 5, mode: Mode::LogicalShift });
        assert_eq!(generator.module_name().unwrap(), "barrel_shifter_32_lsr");

        let (module, shifter) = generator.generate().unwrap();
        assert_eq!(module.name(), "barrel_shifter_32_lsr");
        assert_eq!(shifter.worker.len(), 6);
        assert_eq!(shifter.stages.len(), 5);
        assert!(module.is_register(shifter.ports.result.id()));
        assert!(module.find("worker_5").is_some());
        assert!(module.find("stage_4_cell_31_v").is_some());
    }

    #[test]
    fn rejects_mismatched_ports() {
        let mut k = ModuleBuilder::new("top");
        let ports = BarrelShifterPorts {
            clk: k.declare_clock("clk").unwrap(),
            ce: k.declare_bit("ce", Direction::Input).unwrap(),
            val: k.declare_bus("val", Direction::Input, 8).unwrap(),
            s: k.declare_bus("s", Direction::Input, 2).unwrap(),
            result: k.declare_bus("result", Direction::Output, 8).unwrap(),
        };
        let config = BarrelShifterConfig { power: 3, mode: Mode::Rotate };
        assert_eq!(
            barrel_shifter(&mut k, &ports, config).unwrap_err(),
            ConfigurationError::AmountWidthMismatch { expected: 3, found: 2 }
        );

        let config = BarrelShifterConfig { power: 2, mode: Mode::Rotate };
        assert_eq!(
            barrel_shifter(&mut k, &ports, config).unwrap_err(),
            ConfigurationError::BusWidthMismatch { expected: 4, found: 8 }
        );
    }

    #[test]
    fn rejects_taken_names_before_declaring() {
        let mut k = ModuleBuilder::new("top");
        let ports = BarrelShifterPorts {
            clk: k.declare_clock("clk").unwrap(),
            ce: k.declare_bit("ce", Direction::Input).unwrap(),
            val: k.declare_bus("val", Direction::Input, 4).unwrap(),
            s: k.declare_bus("s", Direction::Input, 2).unwrap(),
            result: k.declare_bus("result", Direction::Output, 4).unwrap(),
        };
        let config = BarrelShifterConfig { power: 2, mode: Mode::LogicalShift };

        let _ = k.declare_bus("worker_2", Direction::Internal, 4).unwrap();
        assert_eq!(
            barrel_shifter(&mut k, &ports, config).unwrap_err(),
            ConfigurationError::Module(ModuleError::DuplicateName("worker_2".to_string()))
        );
        assert!(!k.is_declared("worker_1"));

        let mut k = ModuleBuilder::new("top");
        let ports = BarrelShifterPorts {
            clk: k.declare_clock("clk").unwrap(),
            ce: k.declare_bit("ce", Direction::Input).unwrap(),
            val: k.declare_bus("val", Direction::Input, 4).unwrap(),
            s: k.declare_bus("s", Direction::Input, 2).unwrap(),
            result: k.declare_bus("result", Direction::Output, 4).unwrap(),
        };
        let _ = k.declare_bit("stage_1_cell_3_u", Direction::Internal).unwrap();
        assert_eq!(
            barrel_shifter(&mut k, &ports, config).unwrap_err(),
            ConfigurationError::Module(ModuleError::DuplicateName("stage_1_cell_3_u".to_string()))
        );
        assert!(!k.is_declared("worker_1"));
        assert!(!k.is_declared("stage_0_w_0"));
    }

    #[test]
    fn rejects_power_out_of_range() {
        for power in [0, MAX_POWER + 1] {
            let generator = BarrelShifterGenerator::new(BarrelShifterConfig { power, ..Default::default() });
            assert_eq!(generator.generate().unwrap_err(), ConfigurationError::PowerOutOfRange { power });
        }
    }
}
